//! Test double for the local-function collaborator.
//!
//! [`Labels`] does not compute anything: it tags every input with a label so
//! that tests can observe how the network permutes, folds, and drops inputs.

use crate::func::{FunctionError, LocalFunction, MvCube};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Labels {
    pub inputs: Vec<(u32, u32)>,
    pub output: u32,
    pub ignored: Vec<u32>,
}

impl Labels {
    pub fn binary(labels: &[u32]) -> Self {
        Self {
            inputs: labels.iter().map(|&l| (l, 2)).collect(),
            output: 2,
            ignored: Vec::new(),
        }
    }

    pub fn labels(&self) -> Vec<u32> {
        self.inputs.iter().map(|&(l, _)| l).collect()
    }
}

impl LocalFunction for Labels {
    fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    fn input_values(&self, input: usize) -> u32 {
        self.inputs[input].1
    }

    fn output_values(&self) -> u32 {
        self.output
    }

    fn identity(values: u32) -> Self {
        Self {
            inputs: vec![(0, values)],
            output: values,
            ignored: Vec::new(),
        }
    }

    fn support(&self) -> Vec<usize> {
        (0..self.inputs.len())
            .filter(|&i| !self.ignored.contains(&self.inputs[i].0))
            .collect()
    }

    fn permute(&self, order: &[usize]) -> Self {
        Self {
            inputs: order.iter().map(|&o| self.inputs[o]).collect(),
            ..self.clone()
        }
    }

    fn merge_inputs(&self, _keep: usize, drop: usize) -> Self {
        let mut out = self.clone();
        out.inputs.remove(drop);
        out
    }

    fn cofactor(&self, input: usize, _value: u32) -> Self {
        let mut out = self.clone();
        out.inputs.remove(input);
        out
    }

    fn remap_input(&self, input: usize, values: u32, _map: &[u32]) -> Self {
        let mut out = self.clone();
        out.inputs[input].1 = values;
        out
    }

    fn expand(&self, positions: &[usize], domains: &[u32]) -> Result<Self, FunctionError> {
        let mut slots: Vec<Option<(u32, u32)>> = vec![None; domains.len()];
        for (i, &p) in positions.iter().enumerate() {
            slots[p].get_or_insert(self.inputs[i]);
        }
        Ok(Self {
            inputs: slots
                .into_iter()
                .zip(domains)
                .map(|(s, &d)| s.unwrap_or((u32::MAX, d)))
                .collect(),
            ..self.clone()
        })
    }

    fn collapse(
        &self,
        _input: usize,
        fanin: &Self,
        node_map: &[Option<usize>],
        fanin_map: &[usize],
        domains: &[u32],
    ) -> Result<Self, FunctionError> {
        let mut slots: Vec<Option<(u32, u32)>> = vec![None; domains.len()];
        for (i, p) in node_map.iter().enumerate() {
            if let Some(p) = p {
                slots[*p].get_or_insert(self.inputs[i]);
            }
        }
        for (j, &p) in fanin_map.iter().enumerate() {
            slots[p].get_or_insert(fanin.inputs[j]);
        }
        Ok(Self {
            inputs: slots
                .into_iter()
                .zip(domains)
                .map(|(s, &d)| s.unwrap_or((u32::MAX, d)))
                .collect(),
            ..self.clone()
        })
    }

    fn make_minimum_base(&self) -> (Self, Vec<usize>) {
        let support = self.support();
        let out = Self {
            inputs: support.iter().map(|&i| self.inputs[i]).collect(),
            ..self.clone()
        };
        (out, support)
    }

    fn constant_value(&self) -> Option<u32> {
        if self.inputs.is_empty() {
            Some(0)
        } else {
            None
        }
    }

    fn single_input_map(&self) -> Option<Vec<u32>> {
        None
    }

    fn onset(&self, _value: u32) -> Vec<MvCube> {
        Vec::new()
    }
}
