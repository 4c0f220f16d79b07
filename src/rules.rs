//! Counterparty rules: rule matching and allocation pre-fill

use regex::RegexBuilder;

use crate::types::{
    BankTransaction, Direction, DocKind, Rule, RuleAppliesTo, RuleMatchType,
};

/// First enabled rule whose `match_value` matches the counterparty name.
///
/// Rules are evaluated in feed order. Comparisons are case-insensitive; a
/// rule whose regex fails to compile is skipped with a warning and matching
/// continues with the remaining rules.
pub fn first_matching_rule<'a>(
    rules: &'a [Rule],
    applies_to: DocKind,
    counterparty_name: &str,
) -> Option<&'a Rule> {
    let name = counterparty_name.trim();
    if name.is_empty() {
        return None;
    }
    let wanted = match applies_to {
        DocKind::Receipt => RuleAppliesTo::Receipt,
        DocKind::Invoice => RuleAppliesTo::Invoice,
    };

    rules.iter().find(|rule| {
        if !rule.enabled {
            return false;
        }
        if rule.applies_to != RuleAppliesTo::Both && rule.applies_to != wanted {
            return false;
        }
        let needle = rule.match_value.trim();
        if needle.is_empty() {
            return false;
        }
        match rule.match_type {
            RuleMatchType::Contains => name.to_lowercase().contains(&needle.to_lowercase()),
            RuleMatchType::Equals => name.to_lowercase() == needle.to_lowercase(),
            RuleMatchType::Regex => match RegexBuilder::new(needle)
                .case_insensitive(true)
                .build()
            {
                Ok(re) => re.is_match(name),
                Err(err) => {
                    tracing::warn!(rule_id = %rule.id, %err, "skipping rule with invalid regex");
                    false
                }
            },
        }
    })
}

/// Defaults a rule pre-fills into the allocation form
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSuggestion {
    pub direction: Direction,
    pub category: Option<String>,
    pub account_code: Option<String>,
    pub tax_treatment: Option<String>,
    pub notes: Option<String>,
}

/// Suggest allocation defaults for one transaction.
///
/// Money out consults receipt rules, money in consults invoice rules, keyed
/// by the transaction's counterparty name. The bank-provided category is the
/// fallback when no rule sets one.
pub fn suggest_allocation(txn: &BankTransaction, rules: &[Rule]) -> AllocationSuggestion {
    let direction = Direction::from_amount(txn.amount);
    let applies_to = match direction {
        Direction::MoneyOut => DocKind::Receipt,
        Direction::MoneyIn => DocKind::Invoice,
    };

    let mut suggestion = AllocationSuggestion {
        direction,
        category: None,
        account_code: None,
        tax_treatment: None,
        notes: None,
    };

    if let Some(rule) = first_matching_rule(rules, applies_to, txn.counterparty_name()) {
        if !rule.set_category.is_empty() {
            suggestion.category = Some(rule.set_category.clone());
        }
        if !rule.set_account_code.is_empty() {
            suggestion.account_code = Some(rule.set_account_code.clone());
        }
        if !rule.set_tax_treatment.is_empty() {
            suggestion.tax_treatment = Some(rule.set_tax_treatment.clone());
        }
        if !rule.set_payment_method.is_empty() {
            suggestion.notes = Some(format!("Payment method: {}", rule.set_payment_method));
        }
    }

    if suggestion.category.is_none() {
        suggestion.category = txn.statement_category.clone();
    }

    suggestion
}
