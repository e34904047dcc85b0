/// What a training call reports back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepMetrics {
    /// The mean of the batch losses of the **last** epoch of the call.
    pub loss: f32,
    /// The ratio of correct predictions over **every** sample visited by the call.
    pub accuracy: f32,
}
