//! Ordered fallback chains: strategies are tried in sequence and the first
//! one that produces a value wins.

/// A named step in a fallback chain.
pub struct Strategy<'a, I: ?Sized, O> {
    pub name: &'static str,
    run: Box<dyn Fn(&I) -> Option<O> + 'a>,
}

impl<'a, I: ?Sized, O> Strategy<'a, I, O> {
    pub fn new(name: &'static str, run: impl Fn(&I) -> Option<O> + 'a) -> Self {
        Self {
            name,
            run: Box::new(run),
        }
    }
}

/// First-match-wins evaluator over an ordered list of strategies.
pub struct FirstMatch<'a, I: ?Sized, O> {
    steps: Vec<Strategy<'a, I, O>>,
}

impl<'a, I: ?Sized, O> Default for FirstMatch<'a, I, O> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<'a, I: ?Sized, O> FirstMatch<'a, I, O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy. Order of calls is the order of evaluation.
    pub fn then(mut self, name: &'static str, run: impl Fn(&I) -> Option<O> + 'a) -> Self {
        self.steps.push(Strategy::new(name, run));
        self
    }

    /// Names in evaluation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name).collect()
    }

    /// Run strategies in order; returns the winning strategy's name and value.
    pub fn evaluate(&self, input: &I) -> Option<(&'static str, O)> {
        self.steps
            .iter()
            .find_map(|s| (s.run)(input).map(|v| (s.name, v)))
    }
}
