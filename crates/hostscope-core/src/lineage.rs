//! Sensor installer lineage.
//!
//! Groups the installer catalog by platform and OS bucket and keeps the
//! three newest releases of each bucket as current / previous / oldest.
//! Also holds the naming rules used when installers are saved to disk.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use device_inventory::SensorInstaller;
use serde::{Deserialize, Serialize};

use crate::domain::HostscopeError;

/// Which release of a bucket to pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NMinus {
    Current,
    Previous,
    Oldest,
}

impl NMinus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NMinus::Current => "current",
            NMinus::Previous => "previous",
            NMinus::Oldest => "oldest",
        }
    }
}

impl std::fmt::Display for NMinus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<u8> for NMinus {
    type Error = HostscopeError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            0 => Ok(NMinus::Current),
            1 => Ok(NMinus::Previous),
            2 => Ok(NMinus::Oldest),
            other => Err(HostscopeError::InvalidNMinus(other.to_string())),
        }
    }
}

impl FromStr for NMinus {
    type Err = HostscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map_err(|_| HostscopeError::InvalidNMinus(s.to_string()))
            .and_then(NMinus::try_from)
    }
}

/// The parts of an installer needed to pick and fetch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerRef {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub sha256: String,
}

impl From<&SensorInstaller> for InstallerRef {
    fn from(i: &SensorInstaller) -> Self {
        Self {
            name: i.name.clone(),
            version: i.version.clone(),
            description: i.description.clone(),
            sha256: i.sha256.clone(),
        }
    }
}

/// Up to three releases of one OS bucket, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionLineage {
    pub current: Option<InstallerRef>,
    pub previous: Option<InstallerRef>,
    pub oldest: Option<InstallerRef>,
}

impl VersionLineage {
    /// Fill the next empty slot. Returns false once all three are taken.
    fn push(&mut self, installer: InstallerRef) -> bool {
        for slot in [&mut self.current, &mut self.previous, &mut self.oldest] {
            if slot.is_none() {
                *slot = Some(installer);
                return true;
            }
        }
        false
    }

    pub fn slot(&self, nminus: NMinus) -> Option<&InstallerRef> {
        match nminus {
            NMinus::Current => self.current.as_ref(),
            NMinus::Previous => self.previous.as_ref(),
            NMinus::Oldest => self.oldest.as_ref(),
        }
    }
}

/// platform → bucket → lineage
pub type VersionMap = BTreeMap<String, BTreeMap<String, VersionLineage>>;

/// `"<os> <os_version>"`, trimmed.
pub fn bucket_name(os: &str, os_version: &str) -> String {
    format!("{os} {os_version}").trim().to_string()
}

fn installer_bucket(installer: &SensorInstaller) -> Option<String> {
    let os = installer.os.as_deref().filter(|o| !o.is_empty())?;
    Some(bucket_name(os, installer.os_version.as_deref().unwrap_or("")))
}

/// Build the lineage map from installers sorted newest first.
///
/// Installers missing a platform or OS are skipped.
pub fn build_version_map(installers: &[SensorInstaller]) -> VersionMap {
    let mut map = VersionMap::new();
    for installer in installers {
        let Some(platform) = installer.platform.as_deref().filter(|p| !p.is_empty()) else {
            continue;
        };
        let Some(bucket) = installer_bucket(installer) else {
            continue;
        };
        map.entry(platform.to_string())
            .or_default()
            .entry(bucket)
            .or_default()
            .push(InstallerRef::from(installer));
    }
    map
}

/// Map a user-typed OS alias to the catalog's OS label.
pub fn normalize_os_alias(input: &str) -> Option<&'static str> {
    match input.trim().to_lowercase().as_str() {
        "rhel" | "centos" | "oracle" | "rhel/centos/oracle" => Some("RHEL/CentOS/Oracle"),
        "amzn" | "az" | "amazon" | "amazon linux" => Some("Amazon Linux"),
        "sles" | "suse" => Some("SLES"),
        "ubuntu" | "kali" | "deb" | "debian" => Some("Debian"),
        "win" | "windows" | "microsoft" => Some("Windows"),
        "mac" | "macos" | "apple" => Some("macOS"),
        "container" | "docker" | "kubernetes" => Some("Container"),
        "idp" | "identity" | "identity protection" => Some("Identity*"),
        _ => None,
    }
}

/// Catalog filter for an OS label.
pub fn os_filter(os_label: &str) -> String {
    format!("os:'{os_label}'")
}

/// Keep installers whose OS version equals `os_version`; `None` keeps all.
pub fn filter_by_os_version<'a>(
    installers: &'a [SensorInstaller],
    os_version: Option<&'a str>,
) -> impl Iterator<Item = &'a SensorInstaller> + 'a {
    installers.iter().filter(move |i| match os_version {
        None | Some("") => true,
        Some(v) => i.os_version.as_deref().unwrap_or("") == v,
    })
}

fn is_desktop_os(os: &str) -> bool {
    os == "Windows" || os == "macOS"
}

/// Directory an installer is saved under.
///
/// Windows and macOS share one directory per OS; other buckets get their
/// own, with `/` replaced so the label is a single path component.
pub fn bucket_dir_name(os: &str, os_version: &str) -> String {
    if is_desktop_os(os) {
        return os.to_string();
    }
    bucket_name(os, os_version).replace('/', " ")
}

/// File name an installer is saved as.
///
/// Windows and macOS installers carry the same name across releases, so
/// the version is spliced in before the four-character extension.
pub fn download_file_name(installer: &InstallerRef, os: &str) -> String {
    let name = &installer.name;
    if !is_desktop_os(os) || name.len() < 4 || !name.is_char_boundary(name.len() - 4) {
        return name.clone();
    }
    let (stem, ext) = name.split_at(name.len() - 4);
    format!("{stem}_{}{ext}", installer.version)
}

/// A resolved download for one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    pub bucket: String,
    pub dir: String,
    pub file_name: String,
    pub installer: InstallerRef,
}

/// One step of a download run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStep {
    Fetch(DownloadPlan),
    /// The bucket has no release in the requested slot, usually because its
    /// OS grouping label changed recently.
    Unavailable { bucket: String, slot: NMinus },
}

/// Plan which installers to fetch.
///
/// Walks `installers` (newest first), visiting each bucket once. Without
/// `all` the plan stops after the first fetch. `file_name` overrides the
/// derived file name.
pub fn plan_downloads(
    installers: &[SensorInstaller],
    os_version: Option<&str>,
    nminus: NMinus,
    all: bool,
    file_name: Option<&str>,
) -> Vec<DownloadStep> {
    let map = build_version_map(installers);
    let mut visited = HashSet::new();
    let mut steps = Vec::new();

    for installer in filter_by_os_version(installers, os_version) {
        let (Some(platform), Some(os)) = (installer.platform.as_deref(), installer.os.as_deref())
        else {
            continue;
        };
        let Some(bucket) = installer_bucket(installer) else {
            continue;
        };
        if !visited.insert(bucket.clone()) {
            continue;
        }

        let chosen = map
            .get(platform)
            .and_then(|buckets| buckets.get(&bucket))
            .and_then(|lineage| lineage.slot(nminus));

        let Some(chosen) = chosen else {
            steps.push(DownloadStep::Unavailable {
                bucket,
                slot: nminus,
            });
            continue;
        };

        let os_version = installer.os_version.as_deref().unwrap_or("");
        steps.push(DownloadStep::Fetch(DownloadPlan {
            dir: bucket_dir_name(os, os_version),
            file_name: file_name
                .map(str::to_string)
                .unwrap_or_else(|| download_file_name(chosen, os)),
            installer: chosen.clone(),
            bucket,
        }));

        if !all {
            break;
        }
    }
    steps
}
