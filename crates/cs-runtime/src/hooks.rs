/// Optional inspector callbacks. Fired for foreground and parallel runs;
/// line numbers are opcode indexes and include label lines.
pub trait DebugHooks {
    fn on_script_start(&self, _name: &str, _total_lines: usize, _lines: &[String]) {}

    fn on_line_executed(&self, _name: &str, _line: usize) {}
}
