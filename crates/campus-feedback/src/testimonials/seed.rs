use chrono::{DateTime, TimeZone, Utc};

use super::domain::{Reply, Sentiment, Testimonial, TestimonialId, UserType};
use crate::directory::{ServiceDirectory, ServiceId};

struct Seed {
    id: &'static str,
    name: &'static str,
    role: &'static str,
    content: &'static str,
    rating: u8,
    sentiment: Sentiment,
    date: (i32, u32, u32),
    service_id: &'static str,
    helpful_count: u32,
    is_verified: bool,
    is_featured: bool,
    user_type: Option<UserType>,
}

const SEEDS: [Seed; 12] = [
    Seed {
        id: "t-001",
        name: "Rina Kartika",
        role: "Mahasiswa Teknik Sipil",
        content: "Proses legalisir ijazah sekarang cepat, cukup satu hari kerja dan tanpa biaya tambahan.",
        rating: 5,
        sentiment: Sentiment::Positive,
        date: (2024, 9, 12),
        service_id: "1",
        helpful_count: 14,
        is_verified: true,
        is_featured: true,
        user_type: None,
    },
    Seed {
        id: "t-002",
        name: "Ahmad Fauzi",
        role: "Dosen Fakultas Hukum",
        content: "Koleksi jurnal daring di perpustakaan sangat membantu penelitian saya.",
        rating: 5,
        sentiment: Sentiment::Positive,
        date: (2024, 9, 3),
        service_id: "2",
        helpful_count: 9,
        is_verified: true,
        is_featured: false,
        user_type: None,
    },
    Seed {
        id: "t-003",
        name: "Siti Nurhaliza",
        role: "Mahasiswa Akuntansi",
        content: "Informasi jadwal pembayaran UKT kurang jelas, antrean di loket juga panjang.",
        rating: 2,
        sentiment: Sentiment::Negative,
        date: (2024, 8, 27),
        service_id: "3",
        helpful_count: 21,
        is_verified: true,
        is_featured: false,
        user_type: None,
    },
    Seed {
        id: "t-004",
        name: "Bambang Wijaya",
        role: "Kepala Bagian Umum",
        content: "Koordinasi peminjaman ruang rapat berjalan baik meski formulirnya masih manual.",
        rating: 4,
        sentiment: Sentiment::Mixed,
        date: (2024, 8, 19),
        service_id: "6",
        helpful_count: 3,
        is_verified: false,
        is_featured: false,
        user_type: None,
    },
    Seed {
        id: "t-005",
        name: "Dewi Lestari",
        role: "Calon Mahasiswa 2025",
        content: "Petugas penerimaan mahasiswa baru ramah dan menjawab semua pertanyaan saya.",
        rating: 5,
        sentiment: Sentiment::Positive,
        date: (2024, 8, 2),
        service_id: "4",
        helpful_count: 6,
        is_verified: false,
        is_featured: true,
        user_type: None,
    },
    Seed {
        id: "t-006",
        name: "Yusuf Hidayat",
        role: "Alumni Angkatan 2018",
        content: "Pengurusan surat keterangan lulus cukup, tidak cepat tapi juga tidak bermasalah.",
        rating: 3,
        sentiment: Sentiment::Neutral,
        date: (2024, 7, 22),
        service_id: "1",
        helpful_count: 2,
        is_verified: true,
        is_featured: false,
        user_type: None,
    },
    Seed {
        id: "t-007",
        name: "Maria Ulfa",
        role: "Mitra Industri",
        content: "Proses kerja sama magang lancar, tetapi tanda tangan kontrak memakan waktu lama.",
        rating: 3,
        sentiment: Sentiment::Mixed,
        date: (2024, 7, 15),
        service_id: "4",
        helpful_count: 5,
        is_verified: false,
        is_featured: false,
        user_type: None,
    },
    Seed {
        id: "t-008",
        name: "Eko Prasetyo",
        role: "Staff Laboratorium Fisika",
        content: "Layanan perbaikan jaringan kampus responsif, tiket ditangani kurang dari satu jam.",
        rating: 4,
        sentiment: Sentiment::Positive,
        date: (2024, 6, 30),
        service_id: "5",
        helpful_count: 9,
        is_verified: true,
        is_featured: false,
        user_type: None,
    },
    Seed {
        id: "t-009",
        name: "Lina Marlina",
        role: "Pengunjung Perpustakaan",
        content: "Ruang baca nyaman, namun akses wifi untuk tamu sering terputus.",
        rating: 3,
        sentiment: Sentiment::Neutral,
        date: (2024, 6, 11),
        service_id: "2",
        helpful_count: 1,
        is_verified: false,
        is_featured: false,
        user_type: None,
    },
    Seed {
        id: "t-010",
        name: "Rudi Hartono",
        role: "Mahasiswa Pascasarjana",
        content: "Ada oknum yang menawarkan jasa percepatan berkas dengan imbalan. Mohon ditindak.",
        rating: 1,
        sentiment: Sentiment::Negative,
        date: (2024, 5, 28),
        service_id: "1",
        helpful_count: 30,
        is_verified: true,
        is_featured: false,
        user_type: None,
    },
    Seed {
        id: "t-011",
        name: "Prof. Hendra Gunawan",
        role: "Guru Besar Kimia",
        content: "Pengajuan dana penelitian kini transparan dan statusnya bisa dipantau.",
        rating: 5,
        sentiment: Sentiment::Positive,
        date: (2024, 5, 9),
        service_id: "7",
        helpful_count: 9,
        is_verified: true,
        is_featured: true,
        user_type: None,
    },
    Seed {
        id: "t-012",
        name: "Nadia Putri",
        role: "Orang Tua Mahasiswa",
        content: "Pembayaran UKT lewat virtual account mudah, tapi konfirmasinya masih lambat.",
        rating: 4,
        sentiment: Sentiment::Mixed,
        date: (2024, 4, 18),
        service_id: "3",
        helpful_count: 4,
        is_verified: false,
        is_featured: false,
        user_type: Some(UserType::Public),
    },
];

fn midday(date: (i32, u32, u32)) -> DateTime<Utc> {
    let (year, month, day) = date;
    Utc.with_ymd_and_hms(year, month, day, 9, 30, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Demonstration testimonials served by the mock backend.
pub fn sample_testimonials() -> Vec<Testimonial> {
    let directory = ServiceDirectory::standard();

    SEEDS
        .iter()
        .map(|seed| {
            let service_id = ServiceId::from(seed.service_id);
            let unit = directory.find(&service_id);
            let mut testimonial = Testimonial {
                id: TestimonialId::from(seed.id),
                name: seed.name.to_string(),
                role: seed.role.to_string(),
                content: seed.content.to_string(),
                rating: seed.rating,
                sentiment: seed.sentiment,
                date: midday(seed.date),
                service_name: unit
                    .map(|unit| unit.name.to_string())
                    .unwrap_or_else(|| format!("Layanan {service_id}")),
                region: unit.map(|unit| unit.region.to_string()),
                category: unit.map(|unit| unit.category.slug().to_string()),
                service_id,
                helpful_count: seed.helpful_count,
                is_verified: seed.is_verified,
                is_featured: seed.is_featured,
                replies: Vec::new(),
                user_type: seed.user_type,
            };
            if testimonial.id.0 == "t-003" {
                testimonial.replies.push(Reply {
                    id: "reply-001".to_string(),
                    author: "Admin Bagian Keuangan".to_string(),
                    content: "Terima kasih, jadwal pembayaran kini diumumkan di portal akademik."
                        .to_string(),
                    timestamp: midday((2024, 8, 29)),
                    is_admin: true,
                });
            }
            testimonial
        })
        .collect()
}
