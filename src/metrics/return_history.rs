/// Append-only series of average returns
///
/// The first entry is the pre-training baseline; every later entry is one
/// evaluation, taken every `eval_interval` training steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnHistory {
    returns: Vec<f32>,
}

impl ReturnHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, average_return: f32) {
        self.returns.push(average_return);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.returns
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    pub fn last(&self) -> Option<f32> {
        self.returns.last().copied()
    }

    /// Highest average return so far
    pub fn best(&self) -> Option<f32> {
        self.returns.iter().copied().reduce(f32::max)
    }
}
