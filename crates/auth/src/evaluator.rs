//! Authorization chain evaluation.
//!
//! ```text
//! requirements: [ A, [B | C], D ]
//!
//! A        -> fail? stop, report A's reasons
//! [B | C]  -> run B and C; pass if either passes, else report first failure
//! D        -> fail? stop, report D's reasons
//! ```
//!
//! Top-level requirements are ANDed and short-circuit on the first failure.
//! Members of a group are all evaluated (no intra-group short circuit) and
//! ORed. A satisfied group never skips later requirements.

use std::sync::Arc;

use crate::{
    AuthorizationContext, AuthorizationResult, FailureReason, Policy, PolicyError, PolicyRegistry,
    PolicyRequirement,
};

/// Read-only evaluator over a frozen [`PolicyRegistry`].
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    registry: Arc<PolicyRegistry>,
}

impl PolicyEvaluator {
    pub fn new(registry: PolicyRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Policy>> {
        self.registry.resolve(name)
    }

    /// Walk `requirements` in order against `ctx`.
    ///
    /// An unknown policy name is a configuration error (`Err`), never an
    /// implicit pass.
    pub async fn evaluate(
        &self,
        ctx: &AuthorizationContext,
        requirements: &[PolicyRequirement],
    ) -> Result<AuthorizationResult, PolicyError> {
        for requirement in requirements {
            let result = match requirement {
                PolicyRequirement::Policy(name) => self.check(ctx, name).await?,
                PolicyRequirement::Group(names) => self.check_group(ctx, names).await?,
            };

            if let AuthorizationResult::Error(reasons) = result {
                tracing::debug!(%requirement, ?reasons, "authorization requirement failed");
                return Ok(AuthorizationResult::Error(reasons));
            }
        }

        Ok(AuthorizationResult::Ok)
    }

    async fn check(
        &self,
        ctx: &AuthorizationContext,
        name: &str,
    ) -> Result<AuthorizationResult, PolicyError> {
        let policy = self
            .resolve(name)
            .ok_or_else(|| PolicyError::Unknown(name.to_string()))?;
        Ok(policy.handle(ctx).await)
    }

    async fn check_group<S: AsRef<str>>(
        &self,
        ctx: &AuthorizationContext,
        names: &[S],
    ) -> Result<AuthorizationResult, PolicyError> {
        let mut satisfied = false;
        let mut first_failure: Option<Vec<FailureReason>> = None;

        for name in names {
            match self.check(ctx, name.as_ref()).await? {
                AuthorizationResult::Ok => satisfied = true,
                AuthorizationResult::Error(reasons) => {
                    first_failure.get_or_insert(reasons);
                }
            }
        }

        if satisfied {
            return Ok(AuthorizationResult::Ok);
        }

        // An empty group has no way to pass.
        Ok(AuthorizationResult::Error(
            first_failure.unwrap_or_else(|| vec![FailureReason::Forbidden]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Records its name into a shared log, then returns a fixed outcome.
    struct Recording {
        name: &'static str,
        pass: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Policy for Recording {
        async fn handle(&self, _ctx: &AuthorizationContext) -> AuthorizationResult {
            self.log.lock().unwrap().push(self.name);
            if self.pass {
                AuthorizationResult::Ok
            } else {
                AuthorizationResult::Error(vec![FailureReason::Permission(
                    crate::Permission::from_static(self.name),
                )])
            }
        }
    }

    fn evaluator(policies: &[(&'static str, bool)]) -> (PolicyEvaluator, Arc<Mutex<Vec<&'static str>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = PolicyRegistry::new();
        for (name, pass) in policies {
            registry
                .register(
                    *name,
                    Recording {
                        name: *name,
                        pass: *pass,
                        log: log.clone(),
                    },
                )
                .unwrap();
        }
        (PolicyEvaluator::new(registry), log)
    }

    fn ctx() -> AuthorizationContext {
        AuthorizationContext::anonymous()
    }

    #[tokio::test]
    async fn empty_chain_passes() {
        let (eval, _) = evaluator(&[]);
        assert!(eval.evaluate(&ctx(), &[]).await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn failing_atomic_short_circuits_the_chain() {
        let (eval, log) = evaluator(&[("A", false), ("B", true)]);
        let chain = [PolicyRequirement::policy("A"), PolicyRequirement::policy("B")];

        let res = eval.evaluate(&ctx(), &chain).await.unwrap();

        assert_eq!(res.failure_reasons()[0].as_str(), "A");
        assert_eq!(*log.lock().unwrap(), vec!["A"]);
    }

    #[tokio::test]
    async fn atomic_requirements_are_anded() {
        let (eval, log) = evaluator(&[("A", true), ("B", false)]);
        let chain = [PolicyRequirement::policy("A"), PolicyRequirement::policy("B")];

        let res = eval.evaluate(&ctx(), &chain).await.unwrap();

        assert!(!res.is_ok());
        assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn group_runs_every_member_when_first_passes() {
        let (eval, log) = evaluator(&[("A", true), ("B", true)]);
        let chain = [PolicyRequirement::group(["A", "B"])];

        assert!(eval.evaluate(&ctx(), &chain).await.unwrap().is_ok());
        assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn group_runs_every_member_when_first_fails() {
        let (eval, log) = evaluator(&[("A", false), ("B", true)]);
        let chain = [PolicyRequirement::group(["A", "B"])];

        assert!(eval.evaluate(&ctx(), &chain).await.unwrap().is_ok());
        assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn group_fails_with_first_failure_when_no_member_passes() {
        let (eval, log) = evaluator(&[("A", false), ("B", false)]);
        let chain = [PolicyRequirement::group(["A", "B"])];

        let res = eval.evaluate(&ctx(), &chain).await.unwrap();

        assert_eq!(res.failure_reasons().len(), 1);
        assert_eq!(res.failure_reasons()[0].as_str(), "A");
        assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn satisfied_group_does_not_skip_later_requirements() {
        let (eval, log) = evaluator(&[("A", true), ("B", false)]);
        let chain = [PolicyRequirement::group(["A"]), PolicyRequirement::policy("B")];

        let res = eval.evaluate(&ctx(), &chain).await.unwrap();

        assert!(!res.is_ok());
        assert_eq!(*log.lock().unwrap(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn unknown_policy_is_a_configuration_error() {
        let (eval, _) = evaluator(&[("A", true)]);
        let chain = [PolicyRequirement::policy("A"), PolicyRequirement::policy("Missing")];

        let err = eval.evaluate(&ctx(), &chain).await.unwrap_err();
        assert_eq!(err, PolicyError::Unknown("Missing".to_string()));
    }

    #[tokio::test]
    async fn unknown_policy_inside_group_is_a_configuration_error() {
        let (eval, _) = evaluator(&[("A", true)]);
        let chain = [PolicyRequirement::group(["A", "Missing"])];

        assert!(eval.evaluate(&ctx(), &chain).await.is_err());
    }

    #[tokio::test]
    async fn empty_group_fails_closed() {
        let (eval, _) = evaluator(&[]);
        let chain = [PolicyRequirement::Group(Vec::new())];

        let res = eval.evaluate(&ctx(), &chain).await.unwrap();
        assert_eq!(res.failure_reasons(), &[FailureReason::Forbidden]);
    }
}
