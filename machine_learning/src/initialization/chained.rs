use super::ParamGen;

/// A parameter generator that delegates the generation to a chain of parameter generators.
///
/// Each generator of the chain knows how many parameters it produces, so a model can get a
/// different distribution for every weight matrix and bias vector.
pub struct ChainedParamGen {
    param_gens: Vec<Box<dyn ParamGen>>,
    curr: usize,
}

impl ChainedParamGen {
    /// Creates a new `ChainedParamGen` parameter generator.
    ///
    /// # Arguments
    /// * `param_gens` - A vec of potentially different parameter generators.
    pub fn new(param_gens: Vec<Box<dyn ParamGen>>) -> Self {
        Self {
            param_gens,
            curr: 0,
        }
    }
}

impl ParamGen for ChainedParamGen {
    fn sample(&mut self, n: usize) -> Option<Vec<f32>> {
        if self.curr == self.param_gens.len() {
            return None;
        }

        match self.param_gens[self.curr].sample(n) {
            Some(sample) if sample.len() == n => Some(sample),
            Some(mut sample) => {
                self.curr += 1;

                if let Some(next_sample) = self.sample(n - sample.len()) {
                    sample.extend(next_sample);
                }

                Some(sample)
            }
            None => {
                self.curr += 1;
                self.sample(n)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Yields `limit` copies of `value`, then runs dry.
    struct Fill {
        value: f32,
        remaining: usize,
    }

    impl ParamGen for Fill {
        fn sample(&mut self, n: usize) -> Option<Vec<f32>> {
            if self.remaining == 0 {
                return None;
            }

            let n = n.min(self.remaining);
            self.remaining -= n;
            Some(vec![self.value; n])
        }
    }

    fn fill(value: f32, remaining: usize) -> Box<dyn ParamGen> {
        Box::new(Fill { value, remaining })
    }

    #[test]
    fn empty() {
        let mut param_gen = ChainedParamGen::new(vec![]);
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn spans_generators() {
        let mut param_gen = ChainedParamGen::new(vec![fill(0., 1), fill(1., 3)]);

        assert_eq!(param_gen.sample(2).unwrap(), [0., 1.]);
        assert_eq!(param_gen.sample(2).unwrap(), [1., 1.]);
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn nested() {
        let inner = ChainedParamGen::new(vec![fill(1., 1), fill(2., 1)]);
        let mut param_gen = ChainedParamGen::new(vec![fill(0., 1), Box::new(inner), fill(3., 1)]);

        assert_eq!(param_gen.sample(4).unwrap(), [0., 1., 2., 3.]);
        assert!(param_gen.sample(1).is_none());
    }
}
