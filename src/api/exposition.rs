//! Prometheus text exposition (format version 0.0.4) of a [`Snapshot`].

use crate::snapshot::Snapshot;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Labels attached to a metric family.
#[derive(Debug, Clone, Copy)]
enum Labels {
    /// `host_mount_path`, `host_device` and `path`.
    Volume,
    /// `host_device` only, for properties of the whole filesystem.
    Device,
}

#[derive(Debug, Clone, Copy)]
enum Value {
    Integer(u64),
    Float(f64),
}

struct Gauge {
    name: &'static str,
    help: &'static str,
    labels: Labels,
    value: fn(&Snapshot) -> Value,
}

const GAUGES: &[Gauge] = &[
    Gauge {
        name: "volume_stat_size_bytes",
        help: "Size of all files in the path of the volume",
        labels: Labels::Volume,
        value: |s| Value::Integer(s.scan().size_bytes),
    },
    Gauge {
        name: "volume_stat_files",
        help: "Number of files in the directory",
        labels: Labels::Volume,
        value: |s| Value::Integer(s.scan().files),
    },
    Gauge {
        name: "volume_stat_directories",
        help: "Number of directories in the directory",
        labels: Labels::Volume,
        value: |s| Value::Integer(s.scan().directories),
    },
    Gauge {
        name: "volume_stat_errors",
        help: "Number of errors while reading files",
        labels: Labels::Volume,
        value: |s| Value::Integer(s.scan().errors),
    },
    Gauge {
        name: "volume_stat_runtime_seconds",
        help: "Duration of the last scan in seconds",
        labels: Labels::Volume,
        value: |s| Value::Float(s.scan().elapsed.as_secs_f64()),
    },
    Gauge {
        name: "volume_stat_blocks_available_bytes",
        help: "Bytes available to unprivileged users on the volume's filesystem",
        labels: Labels::Device,
        value: |s| Value::Integer(s.blocks().available_bytes),
    },
    Gauge {
        name: "volume_stat_blocks_free_bytes",
        help: "Free bytes on the volume's filesystem",
        labels: Labels::Device,
        value: |s| Value::Integer(s.blocks().free_bytes),
    },
    Gauge {
        name: "volume_stat_blocks_used_bytes",
        help: "Used bytes on the volume's filesystem",
        labels: Labels::Device,
        value: |s| Value::Integer(s.blocks().used_bytes),
    },
    Gauge {
        name: "volume_stat_blocks_size_bytes",
        help: "Total size of the volume's filesystem in bytes",
        labels: Labels::Device,
        value: |s| Value::Integer(s.blocks().total_bytes),
    },
    Gauge {
        name: "volume_stat_blocks_degraded",
        help: "1 if the block statistics could not be read and the block gauges are zero",
        labels: Labels::Device,
        value: |s| Value::Integer(u64::from(s.blocks_degraded())),
    },
];

/// Renders every gauge of `snapshot`, one sample per family.
pub fn render(snapshot: &Snapshot) -> String {
    let mount = snapshot.mount();
    let host_mount_path = escape_label_value(mount.host_mount_path());
    let host_device = escape_label_value(mount.device());
    let path = escape_label_value(&mount.target().to_string_lossy());

    let mut out = String::with_capacity(2048);
    for gauge in GAUGES {
        let labels = match gauge.labels {
            Labels::Volume => format!(
                "host_mount_path=\"{host_mount_path}\",host_device=\"{host_device}\",path=\"{path}\""
            ),
            Labels::Device => format!("host_device=\"{host_device}\""),
        };
        let value = match (gauge.value)(snapshot) {
            Value::Integer(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
        };

        out.push_str(&format!("# HELP {} {}\n", gauge.name, gauge.help));
        out.push_str(&format!("# TYPE {} gauge\n", gauge.name));
        out.push_str(&format!("{}{{{}}} {}\n", gauge.name, labels, value));
    }
    out
}

fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str(r"\n"),
            c => out.push(c),
        }
    }
    out
}
