// This module builds the per-target selector table: for each IR opcode, the ordered list
// of rules rooted on it, plus the target's type-lowering table. Rules are validated once
// at construction (a rule must root on an opcode and may only narrow to scalar types)
// and the table is never mutated afterwards, so a single table can be shared through an
// Arc by any number of concurrent selections. Lookup tries the candidates for a node's
// opcode strictly in declaration order and returns the first whose fast match succeeds.

//! Per-target selector table.

use hashbrown::HashMap;

use super::lowering::TypeLowering;
use super::rule::Rule;
use super::Target;
use crate::core::dag::NodeId;
use crate::core::error::CompileError;
use crate::ir::{IrDag, IrOpcode};

/// Opcode-indexed, declaration-ordered rule lists for one target.
#[derive(Debug)]
pub struct SelectorTable<T: Target> {
    rules: HashMap<IrOpcode, Vec<Rule<T>>>,
    lowering: TypeLowering<T::Type>,
    count: usize,
}

impl<T: Target> SelectorTable<T> {
    pub fn new(lowering: TypeLowering<T::Type>, rules: impl IntoIterator<Item = Rule<T>>) -> Result<Self, CompileError> {
        let mut table: HashMap<IrOpcode, Vec<Rule<T>>> = HashMap::new();
        let mut count = 0;

        for rule in rules {
            let Some(opcode) = rule.matcher.root_opcode() else {
                return Err(CompileError::InvalidRule {
                    opcode: "<any>".to_string(),
                    reason: format!("rule must root on an opcode: {:?}", rule.matcher),
                });
            };
            rule.matcher.validate().map_err(|reason| CompileError::InvalidRule {
                opcode: opcode.name().to_string(),
                reason,
            })?;

            table.entry(opcode).or_default().push(rule);
            count += 1;
        }

        log::debug!("built selector table: {} rules over {} opcodes", count, table.len());
        Ok(Self {
            rules: table,
            lowering,
            count,
        })
    }

    /// Candidate rules for `opcode`, in declaration order.
    pub fn rules_for(&self, opcode: IrOpcode) -> &[Rule<T>] {
        self.rules.get(&opcode).map_or(&[][..], Vec::as_slice)
    }

    pub fn lowering(&self) -> &TypeLowering<T::Type> {
        &self.lowering
    }

    /// Total number of rules.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// First rule whose fast match accepts `node`, with its declaration index.
    pub fn select(&self, dag: &IrDag, node: NodeId) -> Option<(usize, &Rule<T>)> {
        self.rules_for(dag[node].opcode)
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matcher.fast_match(dag, node))
    }
}
