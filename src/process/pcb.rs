
/// Per-process metrics read from the Linux kernel via /proc.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PcbData {
    pub memory_rss_kb: u64,
    pub memory_percent: f32, // Share of total physical memory, filled in by monitoring
    pub state: char,
}
