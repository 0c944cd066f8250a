/// One playable output binding.
///
/// Every method is a request: none blocks on the device and none fails.
/// Outcomes (`Started`, `Rejected`, `Failed`, ...) come back later as
/// [`SessionEvent`](super::SessionEvent)s carrying the generation of the
/// bind they concern.
pub trait AudioSession {
    /// Stop current output, rewind to 0, attach `url` and start buffering so
    /// that `play` can be issued right after.
    fn bind(&mut self, url: &str, generation: u64);

    /// Request output to start (or resume) on the current binding.
    /// Answered by `Started` or `Rejected`.
    fn play(&mut self);

    fn pause(&mut self);

    /// Halt output and drop the current binding.
    fn stop(&mut self);

    /// Seek. The device clamps to `[0, duration]` on its own.
    fn set_position(&mut self, seconds: f64);

    /// Output gain in `[0, 1]`; independent of play state and kept across binds.
    fn set_gain(&mut self, level: f32);

    /// Release the output for good.
    fn release(&mut self) {
        self.stop();
    }
}
