//! Windowed, scored search proposing at most one document per transaction

use std::collections::{HashMap, HashSet};

use crate::matching::dates::{day_diff, day_key_from_bank_date};
use crate::matching::index::{cents, DocumentIndex, IndexedDoc};
use crate::types::{BankTransaction, InvoiceSummary, MatchSuggestion, ReceiptSummary};

/// Tunable knobs of the scoring algorithm.
///
/// The defaults are the product-approved constants; they are exposed for
/// experimentation, not for silent adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Minimum composite score for a candidate to surface
    pub score_threshold: f64,
    /// Half-width of the amount search window, in cents
    pub window_cents: i64,
    /// Step between probed buckets, in cents
    pub step_cents: i64,
    /// Hard cutoff on the absolute day difference
    pub max_day_window: i64,
    pub amount_weight: f64,
    pub date_weight: f64,
    pub text_weight: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.55,
            window_cents: 100,
            step_cents: 5,
            max_day_window: 7,
            amount_weight: 0.6,
            date_weight: 0.3,
            text_weight: 0.1,
        }
    }
}

/// Lowercase, strip non-alphanumerics, collapse whitespace
pub fn normalize_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = true;
    for c in s.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Composite keys (`kind:id`) of every document currently backing a match.
///
/// Rebuilt from scratch before every pass; a document can back at most one
/// live match at a time.
pub fn build_used_doc_ids(txns: &[BankTransaction]) -> HashSet<String> {
    let mut used = HashSet::new();
    for t in txns {
        if let (Some(kind), Some(id)) = (t.matched_kind, t.matched_id.as_deref()) {
            used.insert(format!("{kind}:{id}"));
        }
    }
    used
}

fn format_amount(amount: f64) -> String {
    format!("R{amount:.2}")
}

/// Scan the cent window around the target amount and keep the single best
/// scoring candidate; ties keep the first found.
fn best_suggestion(
    index: &DocumentIndex,
    target_amount: f64,
    bank_day_key: Option<&str>,
    description: &str,
    used_doc_ids: &HashSet<String>,
    config: &MatchConfig,
) -> Option<MatchSuggestion> {
    let target_cents = cents(target_amount);
    let desc = normalize_text(description);

    let mut best: Option<(&IndexedDoc, f64)> = None;
    let mut offset = -config.window_cents;
    while offset <= config.window_cents {
        for doc in index.bucket(target_cents + offset) {
            if used_doc_ids.contains(&format!("{}:{}", doc.kind, doc.id)) {
                continue;
            }

            let amount_score =
                1.0 - (offset.abs() as f64 / config.window_cents as f64).min(1.0);

            let diff = day_diff(Some(doc.day_key.as_str()), bank_day_key);
            let abs_days = match diff {
                Some(d) => d.abs(),
                None => config.max_day_window + 1,
            };
            if abs_days > config.max_day_window {
                continue;
            }
            let date_score = 1.0 - (abs_days as f64 / config.max_day_window as f64).min(1.0);

            let name = normalize_text(&doc.name);
            let text_score = if !name.is_empty() && (desc.contains(&name) || name.contains(&desc))
            {
                1.0
            } else if !name.is_empty()
                && desc.contains(name.split(' ').next().unwrap_or(""))
            {
                0.5
            } else {
                0.0
            };

            let score = amount_score * config.amount_weight
                + date_score * config.date_weight
                + text_score * config.text_weight;
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((doc, score));
            }
        }
        offset += config.step_cents;
    }

    let (doc, score) = best?;
    if score < config.score_threshold {
        return None;
    }
    Some(MatchSuggestion {
        kind: doc.kind,
        id: doc.id.clone(),
        label: format!(
            "{} • {} • {}",
            doc.name,
            doc.day_key,
            format_amount(doc.amount)
        ),
        score,
    })
}

/// One matching pass over the whole collection.
///
/// Money out (`amount < 0`) is searched against receipts, money in against
/// invoices; already-matched transactions short-circuit to `None`. The
/// document feeds are snapshotted by the caller, so a pass is internally
/// consistent.
pub fn build_suggestions(
    txns: &[BankTransaction],
    receipts: &[ReceiptSummary],
    invoices: &[InvoiceSummary],
    config: &MatchConfig,
) -> HashMap<String, Option<MatchSuggestion>> {
    let used_doc_ids = build_used_doc_ids(txns);
    let receipt_index = DocumentIndex::from_receipts(receipts);
    let invoice_index = DocumentIndex::from_invoices(invoices);

    let mut out = HashMap::with_capacity(txns.len());
    for t in txns {
        if t.is_matched() {
            out.insert(t.id.clone(), None);
            continue;
        }
        let bank_day = day_key_from_bank_date(&t.date);
        let index = if t.amount < 0.0 {
            &receipt_index
        } else {
            &invoice_index
        };
        let suggestion = best_suggestion(
            index,
            t.amount.abs(),
            bank_day.as_deref(),
            t.counterparty_name(),
            &used_doc_ids,
            config,
        );
        out.insert(t.id.clone(), suggestion);
    }
    out
}

/// Looser candidate list for manual linking: the top eight
/// direction-appropriate documents by amount proximity (within about $5).
pub fn quick_candidates<'a>(
    txn: &BankTransaction,
    receipts: &'a [ReceiptSummary],
    invoices: &'a [InvoiceSummary],
) -> Vec<QuickCandidate<'a>> {
    let target = txn.amount.abs();
    let mut scored: Vec<QuickCandidate<'a>> = if txn.amount < 0.0 {
        receipts
            .iter()
            .filter_map(|r| {
                let total = r.total_amount?;
                Some(QuickCandidate {
                    kind: crate::types::DocKind::Receipt,
                    id: &r.id,
                    name: r.display_name(),
                    total_amount: total,
                    proximity: proximity(total, target),
                })
            })
            .collect()
    } else {
        invoices
            .iter()
            .filter_map(|i| {
                let total = i.total_amount?;
                Some(QuickCandidate {
                    kind: crate::types::DocKind::Invoice,
                    id: &i.id,
                    name: i.display_name(),
                    total_amount: total,
                    proximity: proximity(total, target),
                })
            })
            .collect()
    };
    scored.sort_by(|a, b| {
        b.proximity
            .partial_cmp(&a.proximity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(8);
    scored
}

fn proximity(total: f64, target: f64) -> f64 {
    (1.0 - (total.abs() - target).abs() / 5.0).max(0.0)
}

/// A manually linkable document surfaced by [`quick_candidates`]
#[derive(Debug, Clone, PartialEq)]
pub struct QuickCandidate<'a> {
    pub kind: crate::types::DocKind,
    pub id: &'a str,
    pub name: String,
    pub total_amount: f64,
    /// Amount-proximity rank in `[0, 1]`
    pub proximity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocKind;

    fn receipt(id: &str, vendor: &str, date: &str, total: f64) -> ReceiptSummary {
        ReceiptSummary {
            id: id.to_string(),
            status: "approved".to_string(),
            vendor: Some(vendor.to_string()),
            receipt_date: Some(date.to_string()),
            created_at: format!("{date}T08:00:00Z"),
            currency: "ZAR".to_string(),
            total_amount: Some(total),
        }
    }

    fn invoice(id: &str, client: &str, date: &str, total: f64) -> InvoiceSummary {
        InvoiceSummary {
            id: id.to_string(),
            workflow_status: "approved".to_string(),
            client_name: Some(client.to_string()),
            invoice_number: Some("INV-001".to_string()),
            invoice_date: Some(date.to_string()),
            created_at: format!("{date}T08:00:00Z"),
            currency: "ZAR".to_string(),
            total_amount: Some(total),
        }
    }

    fn txn(amount: f64, date: &str, description: &str) -> BankTransaction {
        BankTransaction::new(
            date.to_string(),
            description.to_string(),
            amount,
            "ZAR".to_string(),
        )
    }

    #[test]
    fn exact_match_scores_one() {
        let t = txn(-45.0, "2024-03-01", "Woolworths");
        let suggestions = build_suggestions(
            &[t.clone()],
            &[receipt("r1", "Woolworths", "2024-03-01", 45.0)],
            &[],
            &MatchConfig::default(),
        );
        let s = suggestions[&t.id].as_ref().expect("suggestion expected");
        assert_eq!(s.kind, DocKind::Receipt);
        assert_eq!(s.id, "r1");
        assert!((s.score - 1.0).abs() < 1e-9);
        assert!(s.label.contains("Woolworths"));
        assert!(s.label.contains("2024-03-01"));
        assert!(s.label.contains("R45.00"));
    }

    #[test]
    fn money_in_searches_invoices() {
        let t = txn(120.0, "2024-03-04", "ACME payment");
        let suggestions = build_suggestions(
            &[t.clone()],
            &[],
            &[invoice("i1", "ACME", "2024-03-03", 120.0)],
            &MatchConfig::default(),
        );
        let s = suggestions[&t.id].as_ref().expect("suggestion expected");
        assert_eq!(s.kind, DocKind::Invoice);
        assert_eq!(s.id, "i1");
    }

    #[test]
    fn nine_days_out_is_rejected() {
        let t = txn(-45.0, "2024-03-10", "Woolworths");
        let suggestions = build_suggestions(
            &[t.clone()],
            &[receipt("r1", "Woolworths", "2024-03-01", 45.0)],
            &[],
            &MatchConfig::default(),
        );
        assert!(suggestions[&t.id].is_none());
    }

    #[test]
    fn unresolvable_bank_date_is_rejected() {
        let t = txn(-45.0, "sometime", "Woolworths");
        let suggestions = build_suggestions(
            &[t.clone()],
            &[receipt("r1", "Woolworths", "2024-03-01", 45.0)],
            &[],
            &MatchConfig::default(),
        );
        assert!(suggestions[&t.id].is_none());
    }

    #[test]
    fn used_documents_back_at_most_one_match() {
        let matched = {
            let mut m = txn(-45.0, "2024-03-01", "Woolworths");
            m.matched_kind = Some(DocKind::Receipt);
            m.matched_id = Some("r1".to_string());
            m
        };
        let unmatched = txn(-45.0, "2024-03-01", "Woolworths");
        let suggestions = build_suggestions(
            &[matched.clone(), unmatched.clone()],
            &[receipt("r1", "Woolworths", "2024-03-01", 45.0)],
            &[],
            &MatchConfig::default(),
        );
        // matched transactions short-circuit, and the only candidate is used
        assert!(suggestions[&matched.id].is_none());
        assert!(suggestions[&unmatched.id].is_none());
    }

    #[test]
    fn below_threshold_yields_no_suggestion() {
        // amount off by 80c, 7 days out, no text overlap: 0.6*0.2 = 0.12
        let t = txn(-45.0, "2024-03-08", "XYZ");
        let suggestions = build_suggestions(
            &[t.clone()],
            &[receipt("r1", "Woolworths", "2024-03-01", 45.80)],
            &[],
            &MatchConfig::default(),
        );
        assert!(suggestions[&t.id].is_none());
    }

    #[test]
    fn score_exactly_at_threshold_is_suggested() {
        // half amount score, zero date score, zero text: 0.6 * 0.5 = 0.3
        let config = MatchConfig {
            score_threshold: 0.3,
            ..MatchConfig::default()
        };
        let t = txn(-45.0, "2024-03-08", "XYZ");
        let receipts = [receipt("r1", "Woolworths", "2024-03-01", 45.50)];
        let suggestions =
            build_suggestions(&[t.clone()], &receipts, &[], &config);
        assert!(suggestions[&t.id].is_some());

        let stricter = MatchConfig {
            score_threshold: 0.301,
            ..MatchConfig::default()
        };
        let suggestions = build_suggestions(&[t.clone()], &receipts, &[], &stricter);
        assert!(suggestions[&t.id].is_none());
    }

    #[test]
    fn score_never_decreases_as_deltas_shrink() {
        let config = MatchConfig {
            score_threshold: 0.0,
            ..MatchConfig::default()
        };
        let t = txn(-45.0, "2024-03-05", "Woolworths");
        let mut last = -1.0;
        // walk the amount delta down with the date fixed
        for (i, delta) in [1.00, 0.50, 0.25, 0.0].iter().enumerate() {
            let receipts = [receipt("r1", "Woolworths", "2024-03-03", 45.0 + delta)];
            let suggestions = build_suggestions(&[t.clone()], &receipts, &[], &config);
            let score = suggestions[&t.id].as_ref().unwrap().score;
            assert!(score >= last, "step {i}: {score} < {last}");
            last = score;
        }
        last = -1.0;
        // walk the date delta down with the amount fixed
        for date in ["2024-02-27", "2024-03-01", "2024-03-04", "2024-03-05"] {
            let receipts = [receipt("r1", "Woolworths", date, 45.0)];
            let suggestions = build_suggestions(&[t.clone()], &receipts, &[], &config);
            let score = suggestions[&t.id].as_ref().unwrap().score;
            assert!(score >= last);
            last = score;
        }
    }

    #[test]
    fn first_token_overlap_scores_half() {
        let full = normalize_text("Woolworths Sandton 123");
        assert_eq!(full, "woolworths sandton 123");
        // description carries only the first token of the vendor name
        let t = txn(-45.0, "2024-03-01", "woolworths card 9911");
        let config = MatchConfig {
            score_threshold: 0.0,
            ..MatchConfig::default()
        };
        let suggestions = build_suggestions(
            &[t.clone()],
            &[receipt("r1", "Woolworths Sandton 123", "2024-03-01", 45.0)],
            &[],
            &config,
        );
        let score = suggestions[&t.id].as_ref().unwrap().score;
        // 0.6 + 0.3 + 0.1 * 0.5
        assert!((score - 0.95).abs() < 1e-9);
    }

    #[test]
    fn quick_candidates_rank_by_amount_proximity() {
        let t = txn(-45.0, "2024-03-01", "anything");
        let receipts = [
            receipt("far", "Far", "2024-03-01", 52.0),
            receipt("near", "Near", "2024-03-01", 45.50),
            receipt("exact", "Exact", "2024-03-01", 45.0),
        ];
        let candidates = quick_candidates(&t, &receipts, &[]);
        assert_eq!(candidates[0].id, "exact");
        assert_eq!(candidates[1].id, "near");
        assert_eq!(candidates[2].id, "far");
        assert_eq!(candidates[2].proximity, 0.0);
    }
}
