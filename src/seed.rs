use crate::model::{
    Announcement, AnnouncementCategory, AttendanceRecord, AttendanceStatus, Book, BookBorrow,
    BorrowStatus, CorrectionRequest, Entity, LeaveKind, LeaveRequest, RequestStatus, Role,
    Schedule, User, Weekday,
};
use crate::repo::Repo;
use crate::store::KvStore;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::info;

const CLASS_10A: &str = "Kelas 10A";

/// Write the sample school dataset into every absent collection key.
///
/// Existing keys are left untouched, so running this again (on the same or a
/// later day) is a no-op. Returns the keys that were seeded.
pub fn seed_defaults(store: &dyn KvStore, today: NaiveDate) -> anyhow::Result<Vec<&'static str>> {
    let mut seeded = Vec::new();
    seed_one(store, &default_users(), &mut seeded)?;
    seed_one(store, &default_attendance(today), &mut seeded)?;
    seed_one(store, &default_schedules(), &mut seeded)?;
    seed_one(store, &default_leave_requests(), &mut seeded)?;
    seed_one(store, &default_books(), &mut seeded)?;
    seed_one(store, &default_borrows(), &mut seeded)?;
    seed_one(store, &default_announcements(), &mut seeded)?;
    seed_one::<CorrectionRequest>(store, &[], &mut seeded)?;
    if !seeded.is_empty() {
        info!(keys = ?seeded, "seeded default collections");
    }
    Ok(seeded)
}

fn seed_one<T: Entity>(
    store: &dyn KvStore,
    defaults: &[T],
    seeded: &mut Vec<&'static str>,
) -> anyhow::Result<()> {
    if Repo::<T>::new(store).seed(defaults)? {
        seeded.push(T::KEY);
    }
    Ok(())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

fn avatar(seed: &str, bg: &str) -> Option<String> {
    Some(format!(
        "https://api.dicebear.com/7.x/avataaars/svg?seed={seed}&backgroundColor={bg}"
    ))
}

fn student(id: &str, name: &str, email: &str, seed: &str, bg: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password: "siswa123".to_string(),
        role: Role::Student,
        class_name: Some(CLASS_10A.to_string()),
        student_number: Some(id.to_string()),
        employee_number: None,
        subject: None,
        avatar: avatar(seed, bg),
    }
}

fn teacher(id: &str, name: &str, email: &str, subject: &str, seed: &str, bg: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password: "guru123".to_string(),
        role: Role::Teacher,
        class_name: None,
        student_number: None,
        employee_number: Some(id.to_string()),
        subject: Some(subject.to_string()),
        avatar: avatar(seed, bg),
    }
}

pub fn default_users() -> Vec<User> {
    vec![
        student("STU001", "Fadhila Asla Shana", "fadhila@siswa.sman1mayong.sch.id", "fadhila", "c0aede"),
        student("STU002", "Rizki Pratama", "rizki@siswa.sman1mayong.sch.id", "rizki", "b6e3f4"),
        student("STU003", "Sari Indah", "sari@siswa.sman1mayong.sch.id", "sari", "ffd5dc"),
        student("STU004", "Ahmad Fauzi", "ahmad@siswa.sman1mayong.sch.id", "ahmad", "c0aede"),
        student("STU005", "Maya Sinta", "maya@siswa.sman1mayong.sch.id", "maya", "ffdfbf"),
        teacher(
            "TEA001",
            "Ibu Sari Wulandari",
            "sari.wulandari@guru.sman1mayong.sch.id",
            "Matematika",
            "sariwulandari",
            "c0aede",
        ),
        teacher(
            "TEA002",
            "Bapak Andi Susanto",
            "andi.susanto@guru.sman1mayong.sch.id",
            "Bahasa Indonesia",
            "andi",
            "b6e3f4",
        ),
    ]
}

fn attendance(
    id: &str,
    user_id: &str,
    today: NaiveDate,
    check_in: Option<NaiveTime>,
    status: AttendanceStatus,
    note: Option<&str>,
) -> AttendanceRecord {
    AttendanceRecord {
        id: id.to_string(),
        user_id: user_id.to_string(),
        date: today,
        check_in_time: check_in,
        check_out_time: None,
        status,
        note: note.map(str::to_string),
        corrected_by: None,
    }
}

pub fn default_attendance(today: NaiveDate) -> Vec<AttendanceRecord> {
    use AttendanceStatus::*;
    vec![
        attendance("ATT001", "STU001", today, Some(hm(7, 15)), Present, None),
        attendance("ATT002", "STU002", today, Some(hm(7, 22)), Present, None),
        attendance("ATT003", "STU003", today, None, Absent, Some("No explanation given")),
        attendance("ATT004", "STU004", today, Some(hm(7, 10)), Present, None),
        attendance("ATT005", "STU005", today, Some(hm(7, 45)), Late, None),
    ]
}

pub fn default_schedules() -> Vec<Schedule> {
    use Weekday::*;
    let rows: [(&str, Weekday, (u32, u32), (u32, u32), &str, &str, &str); 19] = [
        ("SCH001", Monday, (7, 0), (8, 30), "Matematika", "Ibu Sari Wulandari", "R.101"),
        ("SCH002", Monday, (8, 30), (10, 0), "Bahasa Indonesia", "Bapak Andi Susanto", "R.101"),
        ("SCH003", Monday, (10, 15), (11, 45), "Bahasa Inggris", "Ibu Diana", "R.102"),
        ("SCH004", Monday, (12, 30), (14, 0), "Fisika", "Bapak Joko", "Lab Fisika"),
        ("SCH005", Tuesday, (7, 0), (8, 30), "Fisika", "Bapak Joko", "Lab Fisika"),
        ("SCH006", Tuesday, (8, 30), (10, 0), "Kimia", "Ibu Dewi", "Lab Kimia"),
        ("SCH007", Tuesday, (10, 15), (11, 45), "Biologi", "Ibu Ani", "Lab Biologi"),
        ("SCH008", Tuesday, (12, 30), (14, 0), "Sejarah", "Bapak Bambang", "R.101"),
        ("SCH009", Wednesday, (7, 0), (8, 30), "Biologi", "Ibu Ani", "Lab Biologi"),
        ("SCH010", Wednesday, (8, 30), (10, 0), "Matematika", "Ibu Sari Wulandari", "R.101"),
        ("SCH011", Wednesday, (10, 15), (11, 45), "PKN", "Bapak Hadi", "R.103"),
        ("SCH012", Wednesday, (12, 30), (14, 0), "Olahraga", "Bapak Rudi", "Lapangan"),
        ("SCH013", Thursday, (7, 0), (8, 30), "Kimia", "Ibu Dewi", "Lab Kimia"),
        ("SCH014", Thursday, (8, 30), (10, 0), "Bahasa Inggris", "Ibu Diana", "R.102"),
        ("SCH015", Thursday, (10, 15), (11, 45), "Seni Budaya", "Ibu Ratna", "R.Seni"),
        ("SCH016", Thursday, (12, 30), (14, 0), "TIK", "Bapak Eko", "Lab Komputer"),
        ("SCH017", Friday, (7, 0), (8, 30), "Agama", "Bapak Usman", "R.Agama"),
        ("SCH018", Friday, (8, 30), (10, 0), "Bahasa Jawa", "Ibu Siti", "R.101"),
        ("SCH019", Friday, (10, 15), (11, 30), "BK", "Ibu Lestari", "R.BK"),
    ];
    rows.into_iter()
        .map(|(id, weekday, start, end, subject, teacher_name, room)| Schedule {
            id: id.to_string(),
            weekday,
            start_time: hm(start.0, start.1),
            end_time: hm(end.0, end.1),
            subject: subject.to_string(),
            teacher_name: teacher_name.to_string(),
            class_name: CLASS_10A.to_string(),
            room: Some(room.to_string()),
        })
        .collect()
}

pub fn default_leave_requests() -> Vec<LeaveRequest> {
    let reviewed = |y, m, d, h| Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single();
    vec![
        LeaveRequest {
            id: "LR001".to_string(),
            user_id: "STU001".to_string(),
            student_name: "Fadhila Asla Shana".to_string(),
            class_name: CLASS_10A.to_string(),
            start_date: date(2026, 1, 15),
            end_date: date(2026, 1, 15),
            kind: LeaveKind::Sick,
            reason: "Demam tinggi, istirahat di rumah atas saran dokter".to_string(),
            status: RequestStatus::Approved,
            created_at: reviewed(2026, 1, 14, 10).unwrap_or_default(),
            reviewer_id: Some("TEA001".to_string()),
            reviewer_note: None,
            reviewed_at: reviewed(2026, 1, 14, 12),
        },
        LeaveRequest {
            id: "LR002".to_string(),
            user_id: "STU001".to_string(),
            student_name: "Fadhila Asla Shana".to_string(),
            class_name: CLASS_10A.to_string(),
            start_date: date(2026, 1, 10),
            end_date: date(2026, 1, 10),
            kind: LeaveKind::Leave,
            reason: "Menghadiri acara keluarga".to_string(),
            status: RequestStatus::Approved,
            created_at: reviewed(2026, 1, 9, 8).unwrap_or_default(),
            reviewer_id: Some("TEA001".to_string()),
            reviewer_note: None,
            reviewed_at: reviewed(2026, 1, 9, 9),
        },
    ]
}

fn book(
    id: &str,
    title: &str,
    author: &str,
    category: &str,
    stock: u32,
    description: &str,
    year: i32,
    photo: &str,
) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        author: author.to_string(),
        category: category.to_string(),
        stock,
        cover: Some(format!(
            "https://images.unsplash.com/photo-{photo}?w=200&h=300&fit=crop"
        )),
        description: Some(description.to_string()),
        year: Some(year),
    }
}

pub fn default_books() -> Vec<Book> {
    vec![
        book(
            "BK001",
            "Laskar Pelangi",
            "Andrea Hirata",
            "Novel",
            5,
            "Novel inspiratif tentang perjuangan anak-anak di Belitung",
            2005,
            "1544947950-fa07a98d237f",
        ),
        book(
            "BK002",
            "Bumi Manusia",
            "Pramoedya Ananta Toer",
            "Novel",
            3,
            "Novel sejarah tentang kehidupan di era kolonial",
            1980,
            "1543002588-bfa74002ed7e",
        ),
        book(
            "BK003",
            "Matematika Dasar Kelas X",
            "Tim Kemendikbud",
            "Pelajaran",
            20,
            "Buku pelajaran matematika untuk kelas X SMA",
            2024,
            "1509228468518-180dd4864904",
        ),
        book(
            "BK004",
            "Fisika untuk SMA",
            "Dr. Sutrisno",
            "Pelajaran",
            15,
            "Panduan lengkap fisika SMA",
            2023,
            "1532012197267-da84d127e765",
        ),
        book(
            "BK005",
            "Kamus Bahasa Inggris",
            "John Echols",
            "Referensi",
            10,
            "Kamus lengkap Indonesia-Inggris",
            2020,
            "1456513080510-7bf3a84b82f8",
        ),
        book(
            "BK006",
            "Sapiens: A Brief History",
            "Yuval Noah Harari",
            "Non-Fiksi",
            2,
            "Sejarah singkat umat manusia",
            2014,
            "1589998059171-988d887df646",
        ),
    ]
}

pub fn default_borrows() -> Vec<BookBorrow> {
    vec![
        BookBorrow {
            id: "BB001".to_string(),
            user_id: "STU001".to_string(),
            book_id: "BK001".to_string(),
            borrow_date: date(2026, 1, 10),
            return_date: None,
            status: BorrowStatus::Borrowed,
        },
        BookBorrow {
            id: "BB002".to_string(),
            user_id: "STU001".to_string(),
            book_id: "BK003".to_string(),
            borrow_date: date(2026, 1, 5),
            return_date: Some(date(2026, 1, 12)),
            status: BorrowStatus::Returned,
        },
    ]
}

fn announcement(
    id: &str,
    title: &str,
    body: &str,
    category: AnnouncementCategory,
    on: NaiveDate,
    author: &str,
    pinned: bool,
) -> Announcement {
    Announcement {
        id: id.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        category,
        date: on,
        author: author.to_string(),
        pinned,
    }
}

pub fn default_announcements() -> Vec<Announcement> {
    use AnnouncementCategory::*;
    vec![
        announcement(
            "ANN001",
            "Libur Semester Genap 2026",
            "Libur semester genap dimulai 1 Februari 2026 sampai 14 Februari 2026. \
             Kegiatan belajar mengajar dimulai kembali pada 15 Februari 2026.",
            Important,
            date(2026, 1, 18),
            "Kepala Sekolah",
            true,
        ),
        announcement(
            "ANN002",
            "Jadwal Ujian Akhir Semester",
            "Ujian Akhir Semester dilaksanakan pada 25-31 Januari 2026. \
             Jadwal lengkap tersedia di papan pengumuman.",
            Academic,
            date(2026, 1, 17),
            "Wakil Kepala Sekolah Bidang Kurikulum",
            true,
        ),
        announcement(
            "ANN003",
            "Lomba Karya Tulis Ilmiah",
            "Pendaftaran lomba karya tulis ilmiah dibuka hingga 30 Januari 2026.",
            Event,
            date(2026, 1, 16),
            "OSIS",
            false,
        ),
        announcement(
            "ANN004",
            "Pemeliharaan Gedung Perpustakaan",
            "Perpustakaan tutup sementara pada 22-23 Januari 2026 untuk pemeliharaan gedung.",
            General,
            date(2026, 1, 15),
            "Bagian Sarana Prasarana",
            false,
        ),
        announcement(
            "ANN005",
            "Pendaftaran Ekstrakurikuler",
            "Pendaftaran ekstrakurikuler semester genap dibuka mulai 15 Februari 2026.",
            Event,
            date(2026, 1, 14),
            "Koordinator Kesiswaan",
            false,
        ),
    ]
}
