//! Explicit multi-valued relation tables.

use mvnet_common::{validate_value_count, ValueSet};
use mvnet_ir::{FunctionError, LocalFunction, MvCube};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest table a [`Relation`] will build.
pub const MAX_TABLE_ENTRIES: usize = 1 << 20;

/// A multi-valued relation over a fixed list of input domains.
///
/// Entry `table[m]` is the set of output values permitted for the input
/// combination `m`, encoded in mixed radix with input 0 as the least
/// significant digit. A relation whose entries are all single values is a
/// function.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    domains: Vec<u32>,
    outputs: u32,
    table: Vec<ValueSet>,
}

fn table_size(domains: &[u32]) -> Result<usize, FunctionError> {
    let mut size = 1usize;
    for &d in domains {
        validate_value_count(d)?;
        size = size
            .checked_mul(d as usize)
            .filter(|&s| s <= MAX_TABLE_ENTRIES)
            .ok_or(FunctionError::TooLarge {
                inputs: domains.len(),
                limit: MAX_TABLE_ENTRIES,
            })?;
    }
    Ok(size)
}

/// Decodes minterm `index` into one value per input.
fn decode(domains: &[u32], mut index: usize, out: &mut [u32]) {
    for (slot, &d) in out.iter_mut().zip(domains) {
        *slot = (index % d as usize) as u32;
        index /= d as usize;
    }
}

fn encode(domains: &[u32], assignment: &[u32]) -> usize {
    assignment
        .iter()
        .zip(domains)
        .rev()
        .fold(0, |acc, (&v, &d)| acc * d as usize + v as usize)
}

impl Relation {
    /// Builds a relation by evaluating `f` on every input combination.
    pub fn from_fn(
        domains: &[u32],
        outputs: u32,
        f: impl Fn(&[u32]) -> ValueSet,
    ) -> Result<Self, FunctionError> {
        validate_value_count(outputs)?;
        let size = table_size(domains)?;
        Ok(Self::build(domains.to_vec(), outputs, size, f))
    }

    /// Builds a deterministic relation from a function returning one value.
    pub fn from_values(
        domains: &[u32],
        outputs: u32,
        f: impl Fn(&[u32]) -> u32,
    ) -> Result<Self, FunctionError> {
        Self::from_fn(domains, outputs, |a| ValueSet::single(f(a)))
    }

    fn build(
        domains: Vec<u32>,
        outputs: u32,
        size: usize,
        mut f: impl FnMut(&[u32]) -> ValueSet,
    ) -> Self {
        let mut assignment = vec![0u32; domains.len()];
        let full = ValueSet::full(outputs);
        let table = (0..size)
            .map(|m| {
                decode(&domains, m, &mut assignment);
                f(&assignment).intersection(full)
            })
            .collect();
        Self {
            domains,
            outputs,
            table,
        }
    }

    /// Rebuilds `self` over `domains`, reading each entry through `lookup`.
    fn rebuild(
        &self,
        domains: Vec<u32>,
        lookup: impl FnMut(&[u32]) -> ValueSet,
    ) -> Result<Self, FunctionError> {
        let size = table_size(&domains)?;
        Ok(Self::build(domains, self.outputs, size, lookup))
    }

    /// The zero-input relation that always produces `value`.
    ///
    /// # Panics
    ///
    /// Panics if `value >= outputs`.
    pub fn constant(outputs: u32, value: u32) -> Self {
        assert!(value < outputs, "constant {value} outside 0..{outputs}");
        Self {
            domains: Vec::new(),
            outputs,
            table: vec![ValueSet::single(value)],
        }
    }

    /// Single-input copy of a `values`-valued signal.
    pub fn buffer(values: u32) -> Self {
        Self {
            domains: vec![values],
            outputs: values,
            table: (0..values).map(ValueSet::single).collect(),
        }
    }

    /// Binary negation.
    pub fn inverter() -> Self {
        Self {
            domains: vec![2],
            outputs: 2,
            table: vec![ValueSet::single(1), ValueSet::single(0)],
        }
    }

    /// Binary conjunction of `inputs` inputs.
    pub fn and(inputs: usize) -> Self {
        let size = 1usize << inputs;
        Self {
            domains: vec![2; inputs],
            outputs: 2,
            table: (0..size)
                .map(|m| ValueSet::single(u32::from(m == size - 1)))
                .collect(),
        }
    }

    /// Binary disjunction of `inputs` inputs.
    pub fn or(inputs: usize) -> Self {
        Self {
            domains: vec![2; inputs],
            outputs: 2,
            table: (0..1usize << inputs)
                .map(|m| ValueSet::single(u32::from(m != 0)))
                .collect(),
        }
    }

    /// Value counts of the inputs.
    pub fn domains(&self) -> &[u32] {
        &self.domains
    }

    /// Number of table entries.
    pub fn table_len(&self) -> usize {
        self.table.len()
    }

    /// Output values permitted for `inputs`.
    ///
    /// # Panics
    ///
    /// Panics if the assignment has the wrong length or a value is out of range.
    pub fn eval(&self, inputs: &[u32]) -> ValueSet {
        assert_eq!(inputs.len(), self.domains.len(), "eval: wrong input count");
        for (i, (&v, &d)) in inputs.iter().zip(&self.domains).enumerate() {
            assert!(v < d, "eval: input {i} value {v} outside 0..{d}");
        }
        self.table[encode(&self.domains, inputs)]
    }

    /// Returns `true` if every input combination has exactly one output value.
    pub fn is_deterministic(&self) -> bool {
        self.table.iter().all(|s| s.len() == 1)
    }

    fn stride(&self, input: usize) -> usize {
        self.domains[..input].iter().map(|&d| d as usize).product()
    }

    fn depends_on(&self, input: usize) -> bool {
        let stride = self.stride(input);
        let domain = self.domains[input] as usize;
        (0..self.table.len()).any(|m| {
            let digit = (m / stride) % domain;
            digit != 0 && self.table[m] != self.table[m - digit * stride]
        })
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Relation({:?} -> {}) ", self.domains, self.outputs)?;
        f.debug_list().entries(self.table.iter()).finish()
    }
}

impl LocalFunction for Relation {
    fn num_inputs(&self) -> usize {
        self.domains.len()
    }

    fn input_values(&self, input: usize) -> u32 {
        self.domains[input]
    }

    fn output_values(&self) -> u32 {
        self.outputs
    }

    fn identity(values: u32) -> Self {
        Self::buffer(values)
    }

    fn support(&self) -> Vec<usize> {
        (0..self.domains.len()).filter(|&i| self.depends_on(i)).collect()
    }

    fn permute(&self, order: &[usize]) -> Self {
        let domains: Vec<u32> = order.iter().map(|&o| self.domains[o]).collect();
        let mut old = vec![0u32; self.domains.len()];
        let size = self.table.len();
        Self::build(domains, self.outputs, size, |a| {
            for (i, &o) in order.iter().enumerate() {
                old[o] = a[i];
            }
            self.table[encode(&self.domains, &old)]
        })
    }

    fn merge_inputs(&self, keep: usize, drop: usize) -> Self {
        assert_eq!(
            self.domains[keep], self.domains[drop],
            "merge_inputs: domains differ"
        );
        let mut domains = self.domains.clone();
        domains.remove(drop);
        let keep_new = if keep > drop { keep - 1 } else { keep };
        let size = self.table.len() / self.domains[drop] as usize;
        Self::build(domains, self.outputs, size, |a| {
            let mut old = a.to_vec();
            old.insert(drop, a[keep_new]);
            self.table[encode(&self.domains, &old)]
        })
    }

    fn cofactor(&self, input: usize, value: u32) -> Self {
        assert!(value < self.domains[input], "cofactor: value out of range");
        let mut domains = self.domains.clone();
        domains.remove(input);
        let size = self.table.len() / self.domains[input] as usize;
        Self::build(domains, self.outputs, size, |a| {
            let mut old = a.to_vec();
            old.insert(input, value);
            self.table[encode(&self.domains, &old)]
        })
    }

    fn remap_input(&self, input: usize, values: u32, map: &[u32]) -> Self {
        assert_eq!(map.len(), values as usize, "remap_input: map length");
        let mut domains = self.domains.clone();
        domains[input] = values;
        let size = self.table.len() / self.domains[input] as usize * values as usize;
        Self::build(domains, self.outputs, size, |a| {
            let mut old = a.to_vec();
            old[input] = map[a[input] as usize];
            self.table[encode(&self.domains, &old)]
        })
    }

    fn expand(&self, positions: &[usize], domains: &[u32]) -> Result<Self, FunctionError> {
        for (i, &p) in positions.iter().enumerate() {
            if domains[p] != self.domains[i] {
                return Err(FunctionError::DomainMismatch {
                    input: i,
                    expected: self.domains[i],
                    found: domains[p],
                });
            }
        }
        self.rebuild(domains.to_vec(), |a| {
            let old: Vec<u32> = positions.iter().map(|&p| a[p]).collect();
            self.table[encode(&self.domains, &old)]
        })
    }

    fn collapse(
        &self,
        input: usize,
        fanin: &Self,
        node_map: &[Option<usize>],
        fanin_map: &[usize],
        domains: &[u32],
    ) -> Result<Self, FunctionError> {
        if fanin.outputs != self.domains[input] {
            return Err(FunctionError::DomainMismatch {
                input,
                expected: self.domains[input],
                found: fanin.outputs,
            });
        }
        for (j, &p) in fanin_map.iter().enumerate() {
            if domains[p] != fanin.domains[j] {
                return Err(FunctionError::DomainMismatch {
                    input: j,
                    expected: fanin.domains[j],
                    found: domains[p],
                });
            }
        }
        for (i, p) in node_map.iter().enumerate() {
            if let Some(p) = *p {
                if domains[p] != self.domains[i] {
                    return Err(FunctionError::DomainMismatch {
                        input: i,
                        expected: self.domains[i],
                        found: domains[p],
                    });
                }
            }
        }
        self.rebuild(domains.to_vec(), |a| {
            let inner: Vec<u32> = fanin_map.iter().map(|&p| a[p]).collect();
            let mut outer: Vec<u32> = node_map.iter().map(|p| p.map_or(0, |p| a[p])).collect();
            let mut out = ValueSet::EMPTY;
            for y in fanin.table[encode(&fanin.domains, &inner)].iter() {
                outer[input] = y;
                out = out.union(self.table[encode(&self.domains, &outer)]);
            }
            out
        })
    }

    fn make_minimum_base(&self) -> (Self, Vec<usize>) {
        let support = self.support();
        if support.len() == self.domains.len() {
            return (self.clone(), support);
        }
        let domains: Vec<u32> = support.iter().map(|&i| self.domains[i]).collect();
        let size = domains.iter().map(|&d| d as usize).product();
        let reduced = Self::build(domains, self.outputs, size, |a| {
            let mut old = vec![0u32; self.domains.len()];
            for (k, &i) in support.iter().enumerate() {
                old[i] = a[k];
            }
            self.table[encode(&self.domains, &old)]
        });
        (reduced, support)
    }

    fn constant_value(&self) -> Option<u32> {
        let first = self.table.first()?.as_single()?;
        self.table
            .iter()
            .all(|s| s.as_single() == Some(first))
            .then_some(first)
    }

    fn single_input_map(&self) -> Option<Vec<u32>> {
        if self.domains.len() != 1 {
            return None;
        }
        self.table.iter().map(|s| s.as_single()).collect()
    }

    fn onset(&self, value: u32) -> Vec<MvCube> {
        if self.domains.is_empty() {
            return if self.table[0].contains(value) {
                vec![MvCube {
                    literals: Vec::new(),
                }]
            } else {
                Vec::new()
            };
        }
        // One cube per combination of inputs 1.., with input 0 as a set.
        let first = self.domains[0] as usize;
        let mut rest = vec![0u32; self.domains.len() - 1];
        let mut cubes = Vec::new();
        for base in (0..self.table.len()).step_by(first) {
            let low: ValueSet = (0..first as u32)
                .filter(|&v| self.table[base + v as usize].contains(value))
                .collect();
            if low.is_empty() {
                continue;
            }
            decode(&self.domains[1..], base / first, &mut rest);
            let mut literals = Vec::with_capacity(self.domains.len());
            literals.push(low);
            literals.extend(rest.iter().map(|&v| ValueSet::single(v)));
            cubes.push(MvCube { literals });
        }
        cubes
    }
}
