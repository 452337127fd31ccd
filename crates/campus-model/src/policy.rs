//! Authorization policy evaluation.
//!
//! Policies are an ordered list of condition/grant pairs. A rule whose
//! condition holds for `(actor, subject)` grants every action it lists;
//! grants are additive across rules, so an action is allowed when any
//! matching rule grants it.

/// One policy rule: a condition over `(actor, subject)` and the actions
/// it grants when the condition holds.
pub struct PolicyRule<A, S> {
    /// Human-readable rule description (for audit logs).
    pub description: &'static str,
    /// Condition the actor/subject pair must satisfy.
    pub condition: fn(&A, &S) -> bool,
    /// Actions granted when the condition holds.
    pub grants: &'static [&'static str],
}

impl<A, S> PolicyRule<A, S> {
    /// Checks whether this rule grants `action` for the given pair.
    #[must_use]
    pub fn grants_action(&self, actor: &A, action: &str, subject: &S) -> bool {
        self.grants.contains(&action) && (self.condition)(actor, subject)
    }
}

/// Evaluates an ordered rule list.
///
/// Returns `true` as soon as any rule grants the action; an action no
/// rule grants is denied.
#[must_use]
pub fn can<A, S>(actor: &A, action: &str, subject: &S, rules: &[PolicyRule<A, S>]) -> bool {
    rules
        .iter()
        .any(|rule| rule.grants_action(actor, action, subject))
}
