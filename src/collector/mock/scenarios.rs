//! Pre-built mock filesystem scenarios for testing.

use super::filesystem::MockFs;

impl MockFs {
    /// A `/proc` layout typical of a small serverless sandbox: two vCPUs,
    /// modest memory, the reporter running as PID 1234 inside a container.
    pub fn serverless_sandbox() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/proc/self/stat",
            "1234 (lamreport) S 1 1234 1234 0 -1 4194304 \
             2500 12 0 0 35 12 0 0 20 0 8 0 5123 190840832 4821 \
             18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0\n",
        );

        fs.add_file(
            "/proc/self/status",
            "\
Name:\tlamreport
Umask:\t0022
State:\tS (sleeping)
Pid:\t1234
PPid:\t1
FDSize:\t64
VmPeak:\t  190272 kB
VmSize:\t  186368 kB
VmRSS:\t   19284 kB
VmSwap:\t       0 kB
Threads:\t8
voluntary_ctxt_switches:\t150
nonvoluntary_ctxt_switches:\t12
",
        );

        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:        3096320 kB
MemFree:         1048576 kB
MemAvailable:    2097152 kB
Buffers:           65536 kB
Cached:           524288 kB
SwapTotal:             0 kB
SwapFree:              0 kB
",
        );

        fs.add_file("/proc/uptime", "12345.67 23456.78\n");

        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 5000 250 1500 40000 500 100 50 0 0 0
cpu1 5000 250 1500 40000 500 100 50 0 0 0
intr 1000000 50 0 0
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );

        fs.add_file("/proc/sys/kernel/hostname", "sandbox-3f2a\n");
        fs.add_file(
            "/proc/sys/kernel/random/boot_id",
            "f9d158c4-6d3b-4b6a-a2f5-0f1c7f0f6c11\n",
        );
        fs.add_file(
            "/proc/self/cgroup",
            "0::/sandbox/5f37a2c9e4b0d8a1f6c3b7e2d9a0c4f8b1e6d3a7c0f9b2e5d8a1c4f7b0e3d6a9\n",
        );

        fs
    }
}
