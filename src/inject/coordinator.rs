//! One-time injection of resource names into a service definition.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, warn};

use super::state::InjectionState;
use crate::config::{MergeTarget, Settings};
use crate::core::ResnamesError;
use crate::naming::{ResolveResource, ResourceNameResolver};
use crate::service::ServiceDefinition;

/// Observable progress of the injection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InjectionPhase {
    /// Nobody asked for names yet.
    Unresolved = 0,
    /// A caller is resolving; others wait for it.
    Resolving = 1,
    /// Names are injected and registries are populated.
    Resolved = 2,
    /// Resolution failed; the error is memoized.
    Failed = 3,
}

impl InjectionPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Resolving,
            2 => Self::Resolved,
            3 => Self::Failed,
            _ => Self::Unresolved,
        }
    }
}

/// Owns the service definition and injects resource names into it exactly once.
///
/// Every consumer goes through [`InjectionCoordinator::ensure_injected`]. The first
/// call resolves every resource and commits the result; concurrent callers wait for
/// that same run, and later callers get the memoized outcome, including a memoized
/// failure. Nothing is written to the service definition unless every resource
/// resolved.
pub struct InjectionCoordinator {
    settings: Arc<Settings>,
    service: RwLock<ServiceDefinition>,
    resolver: Box<dyn ResolveResource>,
    outcome: OnceCell<Result<Arc<InjectionState>, ResnamesError>>,
    phase: AtomicU8,
}

impl std::fmt::Debug for InjectionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionCoordinator")
            .field("settings", &self.settings)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl InjectionCoordinator {
    /// Coordinator using the convention-based [`ResourceNameResolver`].
    #[must_use]
    pub fn new(settings: Arc<Settings>, service: ServiceDefinition) -> Self {
        let resolver = Box::new(ResourceNameResolver::new(Arc::clone(&settings)));
        Self::with_resolver(settings, service, resolver)
    }

    /// Coordinator using a custom per-resource resolver.
    #[must_use]
    pub fn with_resolver(
        settings: Arc<Settings>,
        service: ServiceDefinition,
        resolver: Box<dyn ResolveResource>,
    ) -> Self {
        Self {
            settings,
            service: RwLock::new(service),
            resolver,
            outcome: OnceCell::new(),
            phase: AtomicU8::new(InjectionPhase::Unresolved as u8),
        }
    }

    /// Settings this coordinator runs with.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> InjectionPhase {
        InjectionPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Inject names if that has not happened yet and return the registries.
    ///
    /// # Errors
    ///
    /// Returns the (memoized) error of the injection run.
    pub async fn ensure_injected(&self) -> Result<Arc<InjectionState>, ResnamesError> {
        self.outcome.get_or_init(|| self.run()).await.clone()
    }

    /// A copy of the service definition as it is now.
    pub async fn service_snapshot(&self) -> ServiceDefinition {
        self.service.read().await.clone()
    }

    async fn run(&self) -> Result<Arc<InjectionState>, ResnamesError> {
        self.phase.store(InjectionPhase::Resolving as u8, Ordering::Release);
        let mut service = self.service.write().await;

        match self.inject(&mut service) {
            Ok(state) => {
                self.phase.store(InjectionPhase::Resolved as u8, Ordering::Release);
                Ok(Arc::new(state))
            }
            Err(e) => {
                debug!("Resource name injection failed: {e}");
                self.phase.store(InjectionPhase::Failed as u8, Ordering::Release);
                Err(e)
            }
        }
    }

    fn inject(&self, service: &mut ServiceDefinition) -> Result<InjectionState, ResnamesError> {
        let mut working = service.clone();
        let mut state = InjectionState::new();

        for document in working.resource_documents_mut()? {
            for (logical_id, resource) in document.iter_mut() {
                self.resolver.resolve(logical_id, resource, &mut state)?;
            }
        }

        match self.settings.merge_target {
            MergeTarget::Provider => state.environment().merge_into(working.provider_environment_mut()?),
            MergeTarget::Functions => {
                let environments = working.function_environments_mut()?;
                if environments.is_empty() && !state.environment().is_empty() {
                    warn!("Merge target is 'functions' but the service declares no functions");
                }
                for environment in environments {
                    state.environment().merge_into(environment);
                }
            }
        }

        *service = working;

        info!("Applying resource names...");
        for key in state.environment().keys() {
            info!("    ✔ Exposing env {key}");
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NamingConfig, UnknownTypePolicy};
    use crate::naming::EnvValue;
    use serde_json::{Value, json};
    use std::sync::atomic::AtomicUsize;

    struct Counting {
        inner: ResourceNameResolver,
        calls: Arc<AtomicUsize>,
    }

    impl ResolveResource for Counting {
        fn resolve(
            &self,
            logical_id: &str,
            resource: &mut Value,
            state: &mut InjectionState,
        ) -> Result<(), ResnamesError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve(logical_id, resource, state)
        }
    }

    fn settings() -> Arc<Settings> {
        Arc::new(Settings::new(NamingConfig::new("svc", "dev")))
    }

    fn service(yaml: &str) -> ServiceDefinition {
        ServiceDefinition::from_yaml_str(yaml).unwrap()
    }

    const TWO_RESOURCES: &str = r"
provider:
  environment:
    LOG_LEVEL: debug
    USER_TABLE: stale
functions:
  api:
    handler: api.handler
resources:
  Resources:
    UserTable:
      Type: AWS::DynamoDB::Table
    Jobs:
      Type: AWS::SQS::Queue
";

    #[tokio::test]
    async fn test_resolver_runs_once_per_resource() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Counting {
            inner: ResourceNameResolver::new(settings()),
            calls: Arc::clone(&calls),
        };
        let coordinator = InjectionCoordinator::with_resolver(settings(), service(TWO_RESOURCES), Box::new(resolver));
        assert_eq!(coordinator.phase(), InjectionPhase::Unresolved);

        let first = coordinator.ensure_injected().await.unwrap();
        let second = coordinator.ensure_injected().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(coordinator.phase(), InjectionPhase::Resolved);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Counting {
            inner: ResourceNameResolver::new(settings()),
            calls: Arc::clone(&calls),
        };
        let coordinator = Arc::new(InjectionCoordinator::with_resolver(
            settings(),
            service(TWO_RESOURCES),
            Box::new(resolver),
        ));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                tokio::spawn(async move { coordinator.ensure_injected().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_provider_environment_merge() {
        let coordinator = InjectionCoordinator::new(settings(), service(TWO_RESOURCES));
        coordinator.ensure_injected().await.unwrap();

        let snapshot = coordinator.service_snapshot().await;
        let env = snapshot.provider_environment().unwrap();
        assert_eq!(
            env.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["LOG_LEVEL", "USER_TABLE", "JOBS_ARN", "JOBS_URL", "JOBS"]
        );
        assert_eq!(env["USER_TABLE"], json!("svc-user-table-dev"));
        assert_eq!(env["JOBS_URL"], json!({"Ref": "Jobs"}));
        assert_eq!(
            snapshot.root()["resources"]["Resources"]["Jobs"]["Properties"]["QueueName"],
            json!("svc-jobs-dev")
        );
    }

    #[tokio::test]
    async fn test_function_environment_merge() {
        let settings = Arc::new(Settings::new(NamingConfig::new("svc", "dev")).with_merge_target(MergeTarget::Functions));
        let coordinator = InjectionCoordinator::new(settings, service(TWO_RESOURCES));
        coordinator.ensure_injected().await.unwrap();

        let snapshot = coordinator.service_snapshot().await;
        assert_eq!(snapshot.root()["functions"]["api"]["environment"]["USER_TABLE"], json!("svc-user-table-dev"));
        assert_eq!(snapshot.provider_environment().unwrap()["USER_TABLE"], json!("stale"));
    }

    #[tokio::test]
    async fn test_multi_document_collection() {
        let yaml = r"
resources:
  - Resources:
      UserTable: { Type: AWS::DynamoDB::Table }
  - Outputs: {}
  - Resources:
      OrderTopic: { Type: AWS::SNS::Topic }
";
        let coordinator = InjectionCoordinator::new(settings(), service(yaml));
        let state = coordinator.ensure_injected().await.unwrap();
        assert_eq!(state.name("UserTable"), Some(&json!("svc-user-table-dev")));
        assert_eq!(state.topic("OrderTopic").unwrap().topic_name, "svc-order-topic-dev");
    }

    #[tokio::test]
    async fn test_failure_is_memoized_and_commits_nothing() {
        let yaml = r"
resources:
  Resources:
    UserTable: { Type: AWS::DynamoDB::Table }
    Worker: { Type: AWS::Lambda::Function }
";
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Counting {
            inner: ResourceNameResolver::new(settings()),
            calls: Arc::clone(&calls),
        };
        let original = service(yaml);
        let coordinator = InjectionCoordinator::with_resolver(settings(), original.clone(), Box::new(resolver));

        let first = coordinator.ensure_injected().await.unwrap_err();
        let second = coordinator.ensure_injected().await.unwrap_err();
        assert_eq!(first, second);
        assert!(matches!(first, ResnamesError::MissingStrategy { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(coordinator.phase(), InjectionPhase::Failed);
        assert_eq!(coordinator.service_snapshot().await, original);
    }

    #[tokio::test]
    async fn test_skip_policy_injects_the_rest() {
        let yaml = r"
resources:
  Resources:
    Worker: { Type: AWS::Lambda::Function }
    UserTable: { Type: AWS::DynamoDB::Table }
";
        let settings = Arc::new(Settings::new(NamingConfig::new("svc", "dev")).with_unknown_types(UnknownTypePolicy::Skip));
        let coordinator = InjectionCoordinator::new(settings, service(yaml));
        let state = coordinator.ensure_injected().await.unwrap();
        assert_eq!(state.environment().len(), 1);
        assert_eq!(state.environment().get("USER_TABLE"), Some(&EnvValue::from("svc-user-table-dev")));
    }

    #[tokio::test]
    async fn test_fifo_rerun_on_resolved_tree() {
        let yaml = r"
resources:
  Resources:
    MyQueueTwo:
      Type: AWS::SQS::Queue
      Properties:
        FifoQueue: true
";
        let settings = Arc::new(Settings::new(NamingConfig::new("app", "prod")));
        let first = InjectionCoordinator::new(Arc::clone(&settings), service(yaml));
        first.ensure_injected().await.unwrap();

        // Feed the already resolved tree to a fresh coordinator.
        let second = InjectionCoordinator::new(settings, first.service_snapshot().await);
        let state = second.ensure_injected().await.unwrap();
        assert_eq!(state.name("MyQueueTwo"), Some(&json!("app-my-queue-two-prod.fifo")));
    }
}
