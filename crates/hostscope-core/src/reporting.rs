//! Rendering of search results and installer listings.

use std::path::Path;

use device_inventory::SensorInstaller;

use crate::domain::{HostscopeError, OutputRow, Result, NOT_AVAILABLE};
use crate::lineage::{NMinus, VersionMap};

/// Column names of the CSV search report.
pub const CSV_HEADER: [&str; 9] = [
    "Hostname",
    "Found",
    "Agent Version",
    "Last Check-in",
    "First Check-in",
    "Tags",
    "Customer ID",
    "Cloud Instance ID",
    "Unique Agent ID",
];

fn csv_fields(row: &OutputRow) -> Vec<String> {
    match row {
        OutputRow::Device(r) => vec![
            r.hostname.clone(),
            r.found.to_string(),
            r.agent_version.clone(),
            r.last_seen_display(),
            r.first_seen_display(),
            r.tags_display(),
            r.tenant_display(),
            r.instance_id_display().to_string(),
            r.device_id.to_string(),
        ],
        OutputRow::NotFound { token } => vec![token.clone(), "false".to_string()],
        OutputRow::TransientError { token, message } => vec![token.clone(), message.clone()],
        OutputRow::Refused(refusal) => vec![refusal.to_string()],
    }
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| HostscopeError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| HostscopeError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Render rows as CSV. Diagnostic rows are shorter than the header.
pub fn render_csv(rows: &[OutputRow]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.write_record(csv_fields(row))?;
    }
    finish_csv(writer)
}

/// Render rows as a pretty JSON array.
pub fn render_json(rows: &[OutputRow]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// Render the installer catalog. Without `all` only the common columns are kept.
pub fn render_installers(installers: &[SensorInstaller], all: bool) -> Result<String> {
    let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["Name", "Version", "OS", "OS Version", "Release Date"];
    if all {
        header.extend(["Description", "Platform", "File Type", "File Size", "SHA256"]);
    }
    writer.write_record(&header)?;

    for i in installers {
        let mut record = vec![
            i.name.clone(),
            i.version.clone(),
            opt(&i.os),
            opt(&i.os_version),
            i.release_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ];
        if all {
            record.extend([
                opt(&i.description),
                opt(&i.platform),
                opt(&i.file_type),
                i.file_size
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                i.sha256.clone(),
            ]);
        }
        writer.write_record(&record)?;
    }
    finish_csv(writer)
}

/// One line per platform / bucket showing the chosen slot.
pub fn render_lineage(map: &VersionMap, nminus: NMinus) -> String {
    let mut out = String::new();
    for (platform, buckets) in map {
        out.push_str(&format!("{platform}\n"));
        for (bucket, lineage) in buckets {
            match lineage.slot(nminus) {
                Some(i) => out.push_str(&format!(
                    "  {bucket}: {} {} ({})\n",
                    i.version, i.name, i.sha256
                )),
                None => out.push_str(&format!("  {bucket}: no {nminus} version\n")),
            }
        }
    }
    out
}

/// Write a rendered report to `path`.
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeviceRecord, Refusal};
    use crate::lineage::build_version_map;
    use chrono::{TimeZone, Utc};
    use device_inventory::DeviceId;

    fn record() -> DeviceRecord {
        DeviceRecord {
            hostname: "web01".to_string(),
            found: true,
            agent_version: "7.10.17706.0".to_string(),
            last_seen: Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()),
            first_seen: None,
            tags: Some(vec!["SensorGroupingTags/prod".to_string(), "web".to_string()]),
            tenant_id: "cid-a".to_string(),
            tenant_name: "Company Name".to_string(),
            instance_id: None,
            device_id: DeviceId::new("aid-1"),
        }
    }

    #[test]
    fn csv_render_is_stable() {
        let rows = vec![
            OutputRow::NotFound {
                token: "ghost-machine-001".to_string(),
            },
            OutputRow::Device(record()),
        ];

        let actual = render_csv(&rows).unwrap();
        let expected = "Hostname,Found,Agent Version,Last Check-in,First Check-in,Tags,Customer ID,Cloud Instance ID,Unique Agent ID\n\
ghost-machine-001,false\n\
web01,true,7.10.17706.0,2024-03-01T10:00:00Z,N/A,SensorGroupingTags/prod;web,Company Name : cid-a,N/A,aid-1\n";
        assert_eq!(actual, expected);
    }

    #[test]
    fn csv_renders_refusal_as_single_cell() {
        let refusal = Refusal::AggregateTooLarge {
            matches: 5002,
            limit: 5000,
        };
        let out = render_csv(&[OutputRow::Refused(refusal)]).unwrap();
        assert_eq!(out.lines().nth(1).unwrap(), refusal.to_string());

        let rows = vec![OutputRow::NotFound {
            token: "odd,name".to_string(),
        }];
        let out = render_csv(&rows).unwrap();
        assert_eq!(out.lines().nth(1).unwrap(), "\"odd,name\",false");
    }

    #[test]
    fn json_render_tags_rows_by_kind() {
        let rows = vec![
            OutputRow::Device(record()),
            OutputRow::NotFound {
                token: "ghost".to_string(),
            },
        ];
        let raw: serde_json::Value = serde_json::from_str(&render_json(&rows).unwrap()).unwrap();
        assert_eq!(raw[0]["kind"], "device");
        assert_eq!(raw[0]["hostname"], "web01");
        assert_eq!(raw[1]["kind"], "not_found");
    }

    #[test]
    fn installer_listing_narrows_columns() {
        let installers = vec![SensorInstaller {
            name: "falcon-sensor.deb".to_string(),
            description: None,
            platform: Some("linux".to_string()),
            os: Some("Debian".to_string()),
            os_version: Some("12".to_string()),
            version: "7.12".to_string(),
            sha256: "abc".to_string(),
            release_date: None,
            file_size: Some(42),
            file_type: Some("deb".to_string()),
        }];

        let narrow = render_installers(&installers, false).unwrap();
        assert_eq!(narrow.lines().next().unwrap().split(',').count(), 5);
        assert!(!narrow.contains("abc"));

        let wide = render_installers(&installers, true).unwrap();
        assert!(wide.contains(",42,abc"));

        let lineage = render_lineage(&build_version_map(&installers), NMinus::Previous);
        assert!(lineage.contains("Debian 12: no previous version"));
    }

    #[test]
    fn write_report_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        write_report(&path, "Hostname\n").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Hostname\n");
    }
}
