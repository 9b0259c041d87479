//! Enforcement rules for contracts and transition guards using Validation.

use crate::contract::{FsmSubcontract, FsmTransitionDefinition};
use crate::core::{ConditionEvaluator, Context};
use crate::enforcement::violations::{ContractViolation, GuardViolation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check<E> = Validation<(), NonEmptyVec<E>>;

fn pass<E>() -> Check<E> {
    Validation::success(())
}

/// Check every structural invariant of a contract.
/// Returns Validation::Failure with ALL violations if any fail.
pub fn check_contract(contract: &FsmSubcontract) -> Validation<(), NonEmptyVec<ContractViolation>> {
    let mut checks: Vec<Check<ContractViolation>> = Vec::new();

    let mut seen = HashSet::new();
    for state in &contract.states {
        if !seen.insert(state.name.as_str()) {
            checks.push(Validation::fail(ContractViolation::DuplicateState {
                name: state.name.clone(),
            }));
        }
    }

    checks.push(if seen.contains(contract.initial_state.as_str()) {
        pass()
    } else {
        Validation::fail(ContractViolation::UndeclaredInitialState {
            name: contract.initial_state.clone(),
        })
    });

    let mut transition_names = HashSet::new();
    for transition in &contract.transitions {
        if !transition_names.insert(transition.name.as_str()) {
            tracing::debug!(
                contract = %contract.name,
                transition = %transition.name,
                "Duplicate transition name"
            );
        }
        let trigger = transition.trigger.as_str();
        if trigger.trim().is_empty() || trigger.trim() != trigger {
            checks.push(Validation::fail(ContractViolation::BlankOrPaddedTrigger {
                transition: transition.name.clone(),
                trigger: transition.trigger.clone(),
            }));
        }
        for endpoint in [&transition.from_state, &transition.to_state] {
            if !seen.contains(endpoint.as_str()) {
                checks.push(Validation::fail(ContractViolation::DanglingTransition {
                    transition: transition.name.clone(),
                    state: endpoint.clone(),
                }));
            }
        }
        if contract.is_terminal(&transition.from_state) {
            checks.push(Validation::fail(
                ContractViolation::TerminalStateHasTransitions {
                    state: transition.from_state.clone(),
                    transition: transition.name.clone(),
                },
            ));
        }
    }

    for name in &contract.terminal_states {
        if !seen.contains(name.as_str()) {
            checks.push(Validation::fail(
                ContractViolation::UndeclaredTerminalState { name: name.clone() },
            ));
        }
    }

    for name in &contract.error_states {
        if !seen.contains(name.as_str()) {
            checks.push(Validation::fail(ContractViolation::UndeclaredErrorState {
                name: name.clone(),
            }));
        }
    }

    Validation::all_vec(checks).map(|_| ())
}

/// Outcome of one guard condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionOutcome {
    pub name: String,
    pub expression: String,
    pub required: bool,
    pub passed: bool,
}

/// Result of evaluating every guard of a transition.
#[derive(Clone, Debug, PartialEq)]
pub struct GuardReport {
    pub outcomes: Vec<ConditionOutcome>,
    pub violations: Vec<GuardViolation>,
}

impl GuardReport {
    /// Blocked when at least one required condition failed.
    pub fn is_blocked(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// Evaluate all guards of `transition` against `context`.
///
/// Optional conditions are evaluated and reported but never block.
pub fn enforce_guards(
    transition: &FsmTransitionDefinition,
    context: &Context,
    evaluator: &ConditionEvaluator,
) -> GuardReport {
    let mut outcomes = Vec::with_capacity(transition.conditions.len());
    let mut checks: Vec<Check<GuardViolation>> = Vec::new();

    for guard in &transition.conditions {
        let passed = evaluator.evaluate_condition(guard.condition(), context);
        outcomes.push(ConditionOutcome {
            name: guard.name.clone(),
            expression: guard.expression.clone(),
            required: guard.required,
            passed,
        });

        if !guard.required {
            continue;
        }
        checks.push(if passed {
            pass()
        } else if guard.condition().is_malformed() {
            Validation::fail(GuardViolation::MalformedCondition {
                name: guard.name.clone(),
                expression: guard.expression.clone(),
            })
        } else {
            Validation::fail(GuardViolation::ConditionFailed {
                name: guard.name.clone(),
                expression: guard.expression.clone(),
            })
        });
    }

    let violations = match Validation::all_vec(checks) {
        Validation::Success(_) => Vec::new(),
        Validation::Failure(errors) => errors.iter().cloned().collect(),
    };

    GuardReport {
        outcomes,
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{FsmGuardCondition, FsmStateDefinition};
    use serde_json::json;

    fn contract() -> FsmSubcontract {
        FsmSubcontract {
            name: "c".to_string(),
            version: "1".to_string(),
            initial_state: "a".to_string(),
            states: vec![
                FsmStateDefinition::new("a"),
                FsmStateDefinition::terminal("b"),
            ],
            transitions: vec![FsmTransitionDefinition::new("go", "a", "b", "go")],
            terminal_states: vec![],
            error_states: vec![],
        }
    }

    fn context() -> Context {
        let mut ctx = Context::new();
        ctx.insert("status".to_string(), json!("ready"));
        ctx
    }

    #[test]
    fn valid_contract_succeeds() {
        assert!(check_contract(&contract()).is_success());
    }

    #[test]
    fn contract_checks_accumulate_all_violations() {
        let mut c = contract();
        c.states.push(FsmStateDefinition::new("a"));
        c.transitions
            .push(FsmTransitionDefinition::new("back", "b", "z", "back"));
        c.terminal_states.push("t".to_string());
        c.error_states.push("e".to_string());

        match check_contract(&c) {
            Validation::Failure(errors) => {
                let errors: Vec<ContractViolation> = errors.iter().cloned().collect();
                assert_eq!(errors.len(), 5);
                assert!(errors.contains(&ContractViolation::DuplicateState {
                    name: "a".to_string()
                }));
                assert!(errors.contains(&ContractViolation::DanglingTransition {
                    transition: "back".to_string(),
                    state: "z".to_string()
                }));
                assert!(errors.contains(&ContractViolation::TerminalStateHasTransitions {
                    state: "b".to_string(),
                    transition: "back".to_string()
                }));
                assert!(errors.contains(&ContractViolation::UndeclaredTerminalState {
                    name: "t".to_string()
                }));
                assert!(errors.contains(&ContractViolation::UndeclaredErrorState {
                    name: "e".to_string()
                }));
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }
    }

    #[test]
    fn blank_and_padded_triggers_are_violations() {
        let mut c = contract();
        c.states.push(FsmStateDefinition::new("c"));
        c.transitions
            .push(FsmTransitionDefinition::new("padded", "a", "c", " go"));
        c.transitions.push(FsmTransitionDefinition::new("blank", "a", "c", "  "));

        match check_contract(&c) {
            Validation::Failure(errors) => {
                let errors: Vec<ContractViolation> = errors.iter().cloned().collect();
                assert_eq!(
                    errors,
                    vec![
                        ContractViolation::BlankOrPaddedTrigger {
                            transition: "padded".to_string(),
                            trigger: " go".to_string()
                        },
                        ContractViolation::BlankOrPaddedTrigger {
                            transition: "blank".to_string(),
                            trigger: "  ".to_string()
                        },
                    ]
                );
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }
    }

    #[test]
    fn undeclared_initial_state_fails() {
        let mut c = contract();
        c.initial_state = "missing".to_string();
        assert!(check_contract(&c).is_failure());
    }

    #[test]
    fn guards_pass_when_required_conditions_hold() {
        let t = FsmTransitionDefinition::new("go", "a", "b", "go")
            .with_condition(FsmGuardCondition::required("ready", "status == ready"));

        let report = enforce_guards(&t, &context(), &ConditionEvaluator::default());
        assert!(!report.is_blocked());
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.outcomes[0].passed);
    }

    #[test]
    fn failing_required_conditions_block_and_accumulate() {
        let t = FsmTransitionDefinition::new("go", "a", "b", "go")
            .with_condition(FsmGuardCondition::required("approved", "approved == true"))
            .with_condition(FsmGuardCondition::required("broken", "status =! ready"));

        let report = enforce_guards(&t, &context(), &ConditionEvaluator::default());
        assert!(report.is_blocked());
        assert_eq!(report.violations.len(), 2);
        assert!(matches!(
            report.violations[1],
            GuardViolation::MalformedCondition { .. }
        ));
    }

    #[test]
    fn optional_conditions_never_block() {
        let t = FsmTransitionDefinition::new("go", "a", "b", "go")
            .with_condition(FsmGuardCondition::optional("warm", "cache == warm"));

        let report = enforce_guards(&t, &context(), &ConditionEvaluator::default());
        assert!(!report.is_blocked());
        assert!(!report.outcomes[0].passed);
    }
}
