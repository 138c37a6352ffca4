use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Canonical service-unit identifier.
///
/// Upstream payloads carry service ids both as JSON strings and numbers. Both
/// forms normalize here so comparisons never need to care which one arrived.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        match trimmed.parse::<u64>() {
            Ok(number) => Self(number.to_string()),
            Err(_) => Self(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ServiceId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<u64> for ServiceId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for ServiceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(number) => Ok(Self::from(number)),
            RawId::Text(text) if text.trim().is_empty() => {
                Err(serde::de::Error::custom("service id must not be empty"))
            }
            RawId::Text(text) => Ok(Self::new(text)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Academic,
    StudentAffairs,
    Library,
    Finance,
    Facilities,
    Information,
}

impl ServiceCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Academic => "Layanan Akademik",
            Self::StudentAffairs => "Kemahasiswaan",
            Self::Library => "Perpustakaan",
            Self::Finance => "Keuangan",
            Self::Facilities => "Sarana & Prasarana",
            Self::Information => "Teknologi Informasi",
        }
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::StudentAffairs => "student_affairs",
            Self::Library => "library",
            Self::Finance => "finance",
            Self::Facilities => "facilities",
            Self::Information => "information",
        }
    }
}

/// A university unit users can survey and review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceUnit {
    pub id: ServiceId,
    pub name: &'static str,
    pub category: ServiceCategory,
    pub region: &'static str,
    pub description: &'static str,
}

/// Read-only catalog of service units.
#[derive(Debug, Clone)]
pub struct ServiceDirectory {
    units: Vec<ServiceUnit>,
}

impl ServiceDirectory {
    pub fn new(units: Vec<ServiceUnit>) -> Self {
        Self { units }
    }

    pub fn standard() -> Self {
        let unit = |id: u64,
                    name: &'static str,
                    category: ServiceCategory,
                    region: &'static str,
                    description: &'static str| ServiceUnit {
            id: ServiceId::from(id),
            name,
            category,
            region,
            description,
        };

        Self::new(vec![
            unit(
                1,
                "Biro Administrasi Akademik",
                ServiceCategory::Academic,
                "kampus_utama",
                "Registrasi, KRS, transkrip, dan legalisir dokumen akademik.",
            ),
            unit(
                2,
                "Perpustakaan Pusat",
                ServiceCategory::Library,
                "kampus_utama",
                "Peminjaman koleksi, ruang baca, dan akses jurnal daring.",
            ),
            unit(
                3,
                "Bagian Keuangan",
                ServiceCategory::Finance,
                "kampus_utama",
                "Pembayaran UKT, beasiswa, dan pengembalian dana.",
            ),
            unit(
                4,
                "Biro Kemahasiswaan",
                ServiceCategory::StudentAffairs,
                "kampus_utama",
                "Organisasi mahasiswa, konseling, dan layanan karier.",
            ),
            unit(
                5,
                "Pusat Teknologi Informasi",
                ServiceCategory::Information,
                "kampus_dua",
                "Akun SSO, jaringan kampus, dan sistem informasi akademik.",
            ),
            unit(
                6,
                "Unit Sarana dan Prasarana",
                ServiceCategory::Facilities,
                "kampus_dua",
                "Peminjaman ruang, perawatan gedung, dan kebersihan.",
            ),
            unit(
                7,
                "Layanan Akademik Fakultas Teknik",
                ServiceCategory::Academic,
                "kampus_dua",
                "Administrasi akademik tingkat fakultas dan jadwal ujian.",
            ),
        ])
    }

    pub fn all(&self) -> &[ServiceUnit] {
        &self.units
    }

    pub fn find(&self, id: &ServiceId) -> Option<&ServiceUnit> {
        self.units.iter().find(|unit| &unit.id == id)
    }

    pub fn search(&self, text: &str) -> Vec<&ServiceUnit> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return self.units.iter().collect();
        }
        self.units
            .iter()
            .filter(|unit| {
                unit.name.to_lowercase().contains(&needle)
                    || unit.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn by_category(&self, category: ServiceCategory) -> Vec<&ServiceUnit> {
        self.units
            .iter()
            .filter(|unit| unit.category == category)
            .collect()
    }
}

impl Default for ServiceDirectory {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_id_normalizes_numeric_and_string_forms() {
        let from_number: ServiceId = serde_json::from_str("42").expect("number id");
        let from_string: ServiceId = serde_json::from_str("\" 042 \"").expect("string id");
        assert_eq!(from_number, from_string);
        assert_eq!(from_number.as_str(), "42");

        let slug: ServiceId = serde_json::from_str("\"perpustakaan\"").expect("slug id");
        assert_eq!(slug.as_str(), "perpustakaan");
        assert!(serde_json::from_str::<ServiceId>("\"  \"").is_err());
    }

    #[test]
    fn directory_search_matches_name_or_description() {
        let directory = ServiceDirectory::standard();
        let hits = directory.search("ukt");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Bagian Keuangan");

        let academic = directory.by_category(ServiceCategory::Academic);
        assert_eq!(academic.len(), 2);
        assert!(directory.find(&ServiceId::from("2")).is_some());
        assert!(directory.find(&ServiceId::from("99")).is_none());
    }
}
