//! Per-tick signal de-duplication.

use crate::config::DedupPolicy;
use crate::evaluator::PriceMove;
use dump_core::ContractId;
use std::collections::{HashMap, HashSet};

/// Merge the moves produced by all rules in one tick.
///
/// `PerRule` keeps one move per (contract, rule); the evaluator already
/// produces at most one per pair, so duplicates are only dropped if the
/// same rule index appears twice. `PerContract` keeps the largest
/// absolute move per contract, the earliest rule winning ties. Input
/// order is preserved for survivors.
pub fn apply_dedup(moves: Vec<PriceMove>, policy: DedupPolicy) -> Vec<PriceMove> {
    match policy {
        DedupPolicy::PerRule => {
            let mut seen: HashSet<(ContractId, usize)> = HashSet::with_capacity(moves.len());
            moves
                .into_iter()
                .filter(|m| seen.insert((m.contract.clone(), m.rule_index)))
                .collect()
        }
        DedupPolicy::PerContract => {
            // contract -> index into `moves` of the current winner
            let mut best: HashMap<&ContractId, usize> = HashMap::new();
            for (i, m) in moves.iter().enumerate() {
                match best.get(&m.contract) {
                    Some(&j) => {
                        let current = &moves[j];
                        let stronger = m.raw_change_percent.abs() > current.raw_change_percent.abs();
                        let tie_earlier = m.raw_change_percent.abs() == current.raw_change_percent.abs()
                            && m.rule_index < current.rule_index;
                        if stronger || tie_earlier {
                            best.insert(&m.contract, i);
                        }
                    }
                    None => {
                        best.insert(&m.contract, i);
                    }
                }
            }
            let mut keep = vec![false; moves.len()];
            for &i in best.values() {
                keep[i] = true;
            }
            moves
                .into_iter()
                .zip(keep)
                .filter_map(|(m, k)| k.then_some(m))
                .collect()
        }
    }
}
