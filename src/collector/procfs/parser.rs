//! Parsers for `/proc` filesystem files.
//!
//! Pure functions that parse `/proc` file content into the snapshot
//! structures embedded in a report. Designed to be testable with string
//! inputs.

use std::collections::HashMap;

use serde::Serialize;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Point-in-time snapshot of `/proc/self/stat`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcStatSample {
    pub pid: u32,
    pub comm: String,
    pub state: char,
    pub ppid: u32,
    pub utime: u64,
    pub stime: u64,
    pub cutime: i64,
    pub cstime: i64,
    pub num_threads: i32,
    /// Virtual memory size in bytes.
    pub vsize: u64,
    /// Resident set size in pages.
    pub rss: i64,
}

/// Parses `/proc/self/stat` content.
///
/// The comm field is enclosed in parentheses and may itself contain spaces
/// and parentheses, so the field split happens around the outermost pair.
pub fn parse_proc_stat(content: &str) -> Result<ProcStatSample, ParseError> {
    let content = content.trim();

    let open_paren = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in stat"))?;
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;

    if close_paren <= open_paren {
        return Err(ParseError::new("invalid parentheses in stat"));
    }

    let pid: u32 = content[..open_paren]
        .trim()
        .parse()
        .map_err(|_| ParseError::new("invalid pid"))?;

    let comm = content[open_paren + 1..close_paren].to_string();

    let fields: Vec<&str> = content[close_paren + 1..].split_whitespace().collect();
    if fields.len() < 22 {
        return Err(ParseError::new(format!(
            "not enough fields in stat: expected 22+, got {}",
            fields.len()
        )));
    }

    let parse_u64 = |i: usize| fields[i].parse::<u64>().unwrap_or(0);
    let parse_i64 = |i: usize| fields[i].parse::<i64>().unwrap_or(0);

    Ok(ProcStatSample {
        pid,
        comm,
        state: fields[0].chars().next().unwrap_or('?'),
        ppid: fields[1].parse().unwrap_or(0),
        utime: parse_u64(11),
        stime: parse_u64(12),
        cutime: parse_i64(13),
        cstime: parse_i64(14),
        num_threads: fields[17].parse().unwrap_or(0),
        vsize: parse_u64(20),
        rss: parse_i64(21),
    })
}

/// Point-in-time snapshot of `/proc/self/status`.
///
/// Memory figures are in kilobytes, as reported by the kernel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcStatusSample {
    pub name: String,
    pub pid: u32,
    pub ppid: u32,
    pub fd_size: u64,
    pub threads: u64,
    pub vm_peak: u64,
    pub vm_size: u64,
    pub vm_rss: u64,
    pub vm_swap: u64,
    pub voluntary_ctxt_switches: u64,
    pub nonvoluntary_ctxt_switches: u64,
}

/// Parses `/proc/self/status` content.
///
/// Format is `key:\tvalue` pairs, one per line. Missing keys default to
/// zero/empty rather than failing.
pub fn parse_proc_status(content: &str) -> Result<ProcStatusSample, ParseError> {
    let mut fields: HashMap<&str, &str> = HashMap::new();
    for line in content.lines() {
        if let Some((key, value)) = line.split_once(':') {
            fields.insert(key.trim(), value.trim());
        }
    }

    if fields.is_empty() {
        return Err(ParseError::new("no fields in status"));
    }

    let get_u64 = |key: &str| {
        fields
            .get(key)
            .and_then(|v| v.split_whitespace().next())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    };

    Ok(ProcStatusSample {
        name: fields.get("Name").unwrap_or(&"").to_string(),
        pid: get_u64("Pid") as u32,
        ppid: get_u64("PPid") as u32,
        fd_size: get_u64("FDSize"),
        threads: get_u64("Threads"),
        vm_peak: get_u64("VmPeak"),
        vm_size: get_u64("VmSize"),
        vm_rss: get_u64("VmRSS"),
        vm_swap: get_u64("VmSwap"),
        voluntary_ctxt_switches: get_u64("voluntary_ctxt_switches"),
        nonvoluntary_ctxt_switches: get_u64("nonvoluntary_ctxt_switches"),
    })
}

/// Total and free memory from `/proc/meminfo`, in kilobytes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemTotals {
    pub total_kb: u64,
    pub free_kb: u64,
}

/// Parses `/proc/meminfo` for the memory totals a report carries.
pub fn parse_meminfo(content: &str) -> Result<MemTotals, ParseError> {
    let mut totals = MemTotals::default();
    let mut seen_total = false;

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        match key.trim() {
            "MemTotal" => {
                totals.total_kb = value;
                seen_total = true;
            }
            "MemFree" => totals.free_kb = value,
            _ => {}
        }
    }

    if !seen_total {
        return Err(ParseError::new("MemTotal missing from meminfo"));
    }
    Ok(totals)
}

/// Parses `/proc/uptime`, returning whole seconds since boot.
pub fn parse_uptime(content: &str) -> Result<u64, ParseError> {
    content
        .split_whitespace()
        .next()
        .and_then(|v| v.parse::<f64>().ok())
        .map(|secs| secs as u64)
        .ok_or_else(|| ParseError::new("invalid uptime"))
}

/// Cumulative times for one CPU, from a `cpuN` line of `/proc/stat`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CpuTimes {
    pub cpu_id: u16,
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

/// Parses the per-CPU lines of `/proc/stat` (the aggregate `cpu` line is
/// skipped).
pub fn parse_cpu_times(content: &str) -> Result<Vec<CpuTimes>, ParseError> {
    let mut cpus = Vec::new();

    for line in content.lines() {
        let Some(rest) = line.strip_prefix("cpu") else {
            continue;
        };
        if !rest.starts_with(|c: char| c.is_ascii_digit()) {
            continue; // aggregate line
        }

        let mut fields = rest.split_whitespace();
        let cpu_id: u16 = fields
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| ParseError::new("invalid cpu id"))?;

        let values: Vec<u64> = fields.map(|v| v.parse().unwrap_or(0)).collect();
        if values.len() < 4 {
            return Err(ParseError::new("not enough fields in cpu line"));
        }

        let at = |i: usize| values.get(i).copied().unwrap_or(0);
        cpus.push(CpuTimes {
            cpu_id,
            user: at(0),
            nice: at(1),
            system: at(2),
            idle: at(3),
            iowait: at(4),
            irq: at(5),
            softirq: at(6),
            steal: at(7),
        });
    }

    Ok(cpus)
}

/// Parses `/proc/sys/kernel/random/boot_id` content.
pub fn parse_boot_id(content: &str) -> Result<String, ParseError> {
    let id = content.trim();
    if id.is_empty() {
        return Err(ParseError::new("empty boot id"));
    }
    Ok(id.to_string())
}

/// Extracts a container identifier from `/proc/self/cgroup` content.
///
/// Container runtimes put a 64-hex-digit id somewhere in the cgroup path;
/// bare-metal and VM paths carry no such segment.
pub fn parse_container_id(content: &str) -> Option<String> {
    for line in content.lines() {
        for segment in line.split('/') {
            let segment = segment.trim_end_matches(".scope");
            let segment = segment.rsplit('-').next().unwrap_or(segment);
            if segment.len() == 64 && segment.chars().all(|c| c.is_ascii_hexdigit()) {
                return Some(segment.to_string());
            }
        }
    }
    None
}
