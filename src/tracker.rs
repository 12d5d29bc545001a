//! The tracker facade: one store, one lock, save after every mutation.
//!
//! The store is the unit of concurrency. All operations serialize behind a
//! single mutex, and each mutating call persists the whole document before
//! returning, so on-disk state always reflects the last completed operation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use uuid::Uuid;

use crate::auth::{AccountManager, AdminStore, Notifier, NullNotifier, Session};
use crate::error::Result;
use crate::model::{Priority, Project, ProjectKey, Status, Task};
use crate::store::{StorageGateway, Store};
use crate::workflow::{NewTask, TaskEdit, TransitionPolicy, Workflow};
use crate::Config;

/// Everything a caller-facing layer needs, behind one handle.
pub struct Tracker {
    gateway: StorageGateway,
    admin: AdminStore,
    workflow: Workflow,
    accounts: AccountManager,
    store: Mutex<Store>,
}

impl Tracker {
    /// Open a tracker, failing loudly if the store document is unreadable.
    pub fn open(config: &Config) -> Result<Self> {
        Self::open_with_notifier(config, Arc::new(NullNotifier))
    }

    /// Open a tracker that sends verification codes through `notifier`.
    pub fn open_with_notifier(config: &Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let gateway = StorageGateway::new(&config.data_file);
        let store = gateway.load()?;
        Ok(Self::assemble(config, gateway, store, notifier))
    }

    /// Open a tracker, discarding an unreadable store document.
    pub fn open_or_empty(config: &Config) -> Result<Self> {
        let gateway = StorageGateway::new(&config.data_file);
        let store = gateway.load_or_empty()?;
        Ok(Self::assemble(config, gateway, store, Arc::new(NullNotifier)))
    }

    fn assemble(
        config: &Config,
        gateway: StorageGateway,
        store: Store,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            gateway,
            admin: AdminStore::new(&config.admin_file),
            workflow: Workflow::new(),
            accounts: AccountManager::new(Duration::from_secs(config.pending_ttl_secs), notifier),
            store: Mutex::new(store),
        }
    }

    /// Swap in a custom transition policy.
    pub fn with_policy(mut self, policy: Arc<dyn TransitionPolicy>) -> Self {
        self.workflow = Workflow::with_policy(policy);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Read views
    // ========================================================================

    /// Projects the user owns, cloned out of the store.
    pub fn owned_projects(&self, username: &str) -> Vec<Project> {
        self.lock().owned_projects(username).into_iter().cloned().collect()
    }

    /// Projects the user belongs to as a member, cloned out of the store.
    pub fn member_projects(&self, username: &str) -> Vec<Project> {
        self.lock().member_projects(username).into_iter().cloned().collect()
    }

    pub fn project(&self, key: &ProjectKey) -> Option<Project> {
        self.lock().project(key).cloned()
    }

    pub fn task(&self, key: &ProjectKey, task_id: Uuid) -> Option<Task> {
        self.lock().task(key, task_id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.lock().user_count()
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Start a registration; the store is only touched on confirmation.
    pub fn register(&self, email: &str, username: &str, password: &str) -> Result<Uuid> {
        let store = self.lock();
        self.accounts.register(&store, email, username, password)
    }

    /// Complete a registration with the emailed code.
    pub fn confirm_registration(&self, pending_id: Uuid, code: &str) -> Result<String> {
        let mut store = self.lock();
        let username = self.accounts.confirm(&mut store, pending_id, code)?;
        self.gateway.save(&store)?;
        Ok(username)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let store = self.lock();
        self.accounts.login(&store, username, password)
    }

    pub fn disable_user(&self, username: &str) -> Result<()> {
        let mut store = self.lock();
        self.accounts.disable_user(&mut store, username)?;
        self.gateway.save(&store)
    }

    /// Live pending registrations, expired entries excluded.
    pub fn pending_count(&self) -> usize {
        self.accounts.pending_count()
    }

    // ========================================================================
    // Administrator
    // ========================================================================

    pub fn create_admin(&self, username: &str, password: &str) -> Result<()> {
        self.admin.create(username, password)
    }

    pub fn admin_login(&self, username: &str, password: &str) -> Result<Session> {
        self.admin.login(username, password)
    }

    pub fn disable_admin(&self) -> Result<()> {
        self.admin.disable()
    }

    // ========================================================================
    // Projects and tasks
    // ========================================================================

    pub fn create_project(
        &self,
        actor: &str,
        id: &str,
        title: &str,
        description: &str,
    ) -> Result<ProjectKey> {
        let mut store = self.lock();
        let key = self
            .workflow
            .create_project(&mut store, actor, id, title, description)?;
        self.gateway.save(&store)?;
        Ok(key)
    }

    pub fn delete_project(&self, actor: &str, id: &str) -> Result<()> {
        let mut store = self.lock();
        self.workflow.delete_project(&mut store, actor, id)?;
        self.gateway.save(&store)
    }

    pub fn add_member(&self, actor: &str, id: &str, username: &str) -> Result<()> {
        let mut store = self.lock();
        self.workflow.add_member(&mut store, actor, id, username)?;
        self.gateway.save(&store)
    }

    pub fn remove_member(&self, actor: &str, id: &str, username: &str) -> Result<()> {
        let mut store = self.lock();
        self.workflow.remove_member(&mut store, actor, id, username)?;
        self.gateway.save(&store)
    }

    pub fn create_task(&self, actor: &str, project_id: &str, new_task: NewTask) -> Result<Uuid> {
        let mut store = self.lock();
        let task_id = self
            .workflow
            .create_task(&mut store, actor, project_id, new_task)?;
        self.gateway.save(&store)?;
        Ok(task_id)
    }

    pub fn edit_task(
        &self,
        actor: &str,
        project_id: &str,
        task_id: Uuid,
        edit: TaskEdit,
    ) -> Result<()> {
        let mut store = self.lock();
        self.workflow
            .edit_task(&mut store, actor, project_id, task_id, edit)?;
        self.gateway.save(&store)
    }

    pub fn change_status(
        &self,
        actor: &str,
        project_id: &str,
        task_id: Uuid,
        status: Status,
    ) -> Result<()> {
        let mut store = self.lock();
        self.workflow
            .change_status(&mut store, actor, project_id, task_id, status)?;
        self.gateway.save(&store)
    }

    pub fn change_priority(
        &self,
        actor: &str,
        project_id: &str,
        task_id: Uuid,
        priority: Priority,
    ) -> Result<()> {
        let mut store = self.lock();
        self.workflow
            .change_priority(&mut store, actor, project_id, task_id, priority)?;
        self.gateway.save(&store)
    }

    pub fn add_comment(
        &self,
        actor: &str,
        project_id: &str,
        task_id: Uuid,
        text: &str,
    ) -> Result<()> {
        let mut store = self.lock();
        self.workflow
            .add_comment(&mut store, actor, project_id, task_id, text)?;
        self.gateway.save(&store)
    }
}
