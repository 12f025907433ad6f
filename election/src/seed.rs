//! Default election data seeded into an empty store.
//!
//! The roster is the canonical deployment data: six candidate pairs, 31
//! teacher voters across three organizational units, and two admin accounts.
//! `ElectionStore::initialize` inserts each entity class only when its
//! collection is empty, so repeated startups never duplicate rows.

use serde::Serialize;

use pemilu_store::admin::AdminAccount;
use pemilu_store::candidate::Candidate;
use pemilu_store::voter::Voter;
use pemilu_types::{AdminId, CandidateId, Timestamp, VoterId};

/// What `initialize` actually inserted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub candidates_added: u64,
    pub voters_added: u64,
    pub admins_added: u64,
}

impl BootstrapReport {
    pub fn seeded_any(&self) -> bool {
        self.candidates_added + self.voters_added + self.admins_added > 0
    }
}

/// Voter roster: id, username, name, unit.
const ROSTER: &[(u32, &str, &str, &str)] = &[
    (1, "guru01", "Faizzuddin Prawiranegara", "diknas"),
    (2, "guru02", "Rohemi", "diknas"),
    (3, "guru03", "Anis Fuad", "diknas"),
    (4, "guru04", "Helmi Agustian", "diknas"),
    (5, "guru05", "Murni", "diknas"),
    (6, "guru06", "Siti Roudotul Fadillah", "diknas"),
    (7, "guru07", "Vinka Nur Octaviani", "diknas"),
    (8, "guru08", "Iptikarul Ilmi", "diknas"),
    (9, "guru09", "Mutamimah", "diknas"),
    (10, "guru10", "Febi Rizki Anisah", "diknas"),
    (11, "guru11", "Pipit Eka Kurniawati", "diknas"),
    (12, "guru12", "Nurhikmatul Aliyah", "diknas"),
    (13, "guru13", "Istiqomah Cahyani", "diknas"),
    (14, "guru14", "Sutisna", "diknas"),
    (15, "guru15", "Nadiyah Aulia Rahmah", "diknas"),
    (16, "guru16", "Aji Sukma Iqbal Najibulloh", "diknas"),
    (17, "guru17", "Iwan Gunawan", "pengasuhan"),
    (18, "guru18", "Tb Sultan Mardotillah", "pengasuhan"),
    (19, "guru19", "Ust Atif Media", "pengasuhan"),
    (20, "guru20", "Windi", "pengasuhan"),
    (21, "guru21", "Wulan", "pengasuhan"),
    (22, "guru22", "Muhammad Yahya Ayas", "pengasuhan"),
    (23, "guru23", "Asep", "pengasuhan"),
    (24, "guru24", "Afni", "pengasuhan"),
    (25, "guru25", "Nur Indah Fitriana", "pengasuhan"),
    (26, "guru26", "Mahrus Sholeh", "tahfidz"),
    (27, "guru27", "Restu", "tahfidz"),
    (28, "guru28", "Jihan", "tahfidz"),
    (29, "guru29", "Arruh", "tahfidz"),
    (30, "guru30", "Diki amarullah", "tahfidz"),
    (31, "guru31", "Novi", "tahfidz"),
];

/// The default voter roster, all in the not-voted state.
pub fn default_voters(now: Timestamp) -> Vec<Voter> {
    ROSTER
        .iter()
        .map(|&(id, username, name, class)| {
            Voter::new(VoterId::new(id), username, name, class, now)
        })
        .collect()
}

struct CandidateSeed {
    id: u32,
    name: &'static str,
    class: &'static str,
    slogan: &'static str,
    tags: [&'static str; 3],
    vision: &'static str,
    mission: [&'static str; 3],
    photo: &'static str,
    running_mate_photo: &'static str,
}

/// Candidate slate. Ballot numbers are assigned 1..=6 in id order; the legacy
/// roster reused numbers 1 and 3, which a unique ballot-number index rejects.
const SLATE: &[CandidateSeed] = &[
    CandidateSeed {
        id: 1,
        name: "MUHAMAD FADLAN ARFANI",
        class: "XI C",
        slogan: "Bersama Membangun Prestasi",
        tags: ["Ganteng", "Prestasi", "Loyalitas"],
        vision: "Mewujudkan OSSIP yang inovatif, aspiratif, dan berprestasi di tingkat \
                 regional dengan mengedepankan transparansi dan partisipasi aktif seluruh siswa.",
        mission: [
            "Meningkatkan kualitas kegiatan ekstrakurikuler",
            "Memperkuat komunikasi antara siswa dan pihak sekolah",
            "Mengembangkan program kreatif dan inovatif",
        ],
        photo: "https://randomuser.me/api/portraits/men/32.jpg",
        running_mate_photo: "https://randomuser.me/api/portraits/men/33.jpg",
    },
    CandidateSeed {
        id: 2,
        name: "PRAMUDITA AULADI",
        class: "XI C",
        slogan: "Kreatif, Inovatif, dan Kolaboratif",
        tags: ["Kreatif", "Kolaborasi", "Aspiratif"],
        vision: "Menjadikan OSSIP sebagai wadah pengembangan potensi siswa secara maksimal \
                 melalui program kreatif, inovatif, dan kolaboratif dengan seluruh elemen sekolah.",
        mission: [
            "Menciptakan lingkungan belajar yang nyaman",
            "Mengadakan event kreatif tahunan",
            "Membangun sistem aspirasi siswa yang efektif",
        ],
        photo: "https://randomuser.me/api/portraits/women/44.jpg",
        running_mate_photo: "https://randomuser.me/api/portraits/women/45.jpg",
    },
    CandidateSeed {
        id: 3,
        name: "DHARMA ALIF SAPUTRA",
        class: "XI D",
        slogan: "Satu untuk Semua, Semua untuk Satu",
        tags: ["Solidaritas", "Transparan", "Fleksibel"],
        vision: "Membentuk OSIS yang solid, transparan, dan berorientasi pada kebutuhan siswa \
                 dengan mengutamakan prinsip gotong royong dan kebersamaan.",
        mission: [
            "Meningkatkan solidaritas antar siswa",
            "Menerapkan sistem kerja yang transparan",
            "Responsif terhadap kebutuhan siswa",
        ],
        photo: "https://randomuser.me/api/portraits/men/65.jpg",
        running_mate_photo: "",
    },
    CandidateSeed {
        id: 4,
        name: "AMRELINA",
        class: "XI C",
        slogan: "Satu untuk Semua, Semua untuk Satu",
        tags: ["Solidaritas", "Transparan", "Fleksibel"],
        vision: "Menjadikan organisasi santri Insan Pratama 2 sebagai organisasi yang aktif, \
                 disiplin, dan bertanggung jawab dalam membentuk santri yang berakhlak baik, \
                 berprestasi, serta menjunjung tinggi nilai-nilai islam dan budaya pesantren",
        mission: [
            "Meningkatkan keamanan dan ketakwaan santri melalui kegiatan keagamaan",
            "Menumbuhkan rasa kebersamaan persaudaraan dan kepedulian sosial",
            "Membentuk karakter santri yang disiplin, sopan, dan bertanggung jawab",
        ],
        photo: "https://randomuser.me/api/portraits/men/65.jpg",
        running_mate_photo: "",
    },
    CandidateSeed {
        id: 5,
        name: "KHOLIDAH IZZATI",
        class: "XI D",
        slogan: "Satu untuk Semua, Semua untuk Satu",
        tags: ["Solidaritas", "Transparan", "Fleksibel"],
        vision: "Mewujudkan lingkungan smaq insan pratama yang harmonis, kreatif, dan penuh \
                 semangat kebersamaan sehingga setiap santri dapat berkembang secara akademik \
                 spiritual, dan social",
        mission: [
            "Meningkatkan kualitas organisasi melalui program-program kreatif dan positif yang bermanfaat untuk semua santri",
            "Mendorong partisipasi aktif santri dalam kegiatan ossip, agar suara setiap santri terdengar dan di hargai",
            "Membina budaya kebersamaan dan kepeduliaan antar santri melalui kegiatan sehari-hari",
        ],
        photo: "https://randomuser.me/api/portraits/men/65.jpg",
        running_mate_photo: "",
    },
    CandidateSeed {
        id: 6,
        name: "NAVA AISILA HASNA",
        class: "XI D",
        slogan: "Satu untuk Semua, Semua untuk Satu",
        tags: ["Solidaritas", "Transparan", "Fleksibel"],
        vision: "Membentuk OSIS yang solid, transparan, dan berorientasi pada kebutuhan siswa \
                 dengan mengutamakan prinsip gotong royong dan kebersamaan.",
        mission: [
            "Meningkatkan solidaritas antar siswa",
            "Menerapkan sistem kerja yang transparan",
            "Responsif terhadap kebutuhan siswa",
        ],
        photo: "https://randomuser.me/api/portraits/men/65.jpg",
        running_mate_photo: "",
    },
];

/// The default candidate slate with zeroed tallies.
pub fn default_candidates(now: Timestamp) -> Vec<Candidate> {
    SLATE
        .iter()
        .map(|seed| Candidate {
            id: CandidateId::new(seed.id),
            number: seed.id,
            name: seed.name.to_string(),
            running_mate: String::new(),
            class: seed.class.to_string(),
            slogan: seed.slogan.to_string(),
            tags: seed.tags.iter().map(|t| t.to_string()).collect(),
            vision: seed.vision.to_string(),
            mission: seed.mission.iter().map(|m| m.to_string()).collect(),
            photo: seed.photo.to_string(),
            running_mate_photo: seed.running_mate_photo.to_string(),
            vote_count: 0,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

/// The default admin accounts.
pub fn default_admins(now: Timestamp) -> Vec<AdminAccount> {
    vec![
        AdminAccount {
            id: AdminId::new(1),
            username: "admin".to_string(),
            name: "Admin Panitia".to_string(),
            password: "admin123".to_string(),
            role: "super_admin".to_string(),
            permissions: ["view", "edit", "delete", "reset", "export", "audit"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            email: "admin@school.edu".to_string(),
            phone: "081234567890".to_string(),
            created_at: now,
            updated_at: now,
        },
        AdminAccount {
            id: AdminId::new(2),
            username: "panitia".to_string(),
            name: "Panitia Pemilihan".to_string(),
            password: "panitia123".to_string(),
            role: "admin".to_string(),
            permissions: ["view", "reset"].iter().map(|p| p.to_string()).collect(),
            email: "panitia@school.edu".to_string(),
            phone: "081234567891".to_string(),
            created_at: now,
            updated_at: now,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn roster_has_31_unique_usernames_across_three_units() {
        let voters = default_voters(Timestamp::new(1));
        assert_eq!(voters.len(), 31);

        let usernames: HashSet<&str> = voters.iter().map(|v| v.username.as_str()).collect();
        assert_eq!(usernames.len(), 31);

        let classes: HashSet<&str> = voters.iter().map(|v| v.class.as_str()).collect();
        assert_eq!(
            classes,
            HashSet::from(["diknas", "pengasuhan", "tahfidz"])
        );
        assert!(voters.iter().all(|v| !v.has_voted));
    }

    #[test]
    fn slate_has_six_candidates_with_unique_ballot_numbers() {
        let candidates = default_candidates(Timestamp::new(1));
        assert_eq!(candidates.len(), 6);

        let numbers: HashSet<u32> = candidates.iter().map(|c| c.number).collect();
        assert_eq!(numbers, HashSet::from([1, 2, 3, 4, 5, 6]));
        assert!(candidates.iter().all(|c| c.vote_count == 0));
    }

    #[test]
    fn admins_cover_both_roles() {
        let admins = default_admins(Timestamp::new(1));
        assert_eq!(admins.len(), 2);
        assert_eq!(admins[0].role, "super_admin");
        assert!(admins[0]
            .effective_permissions()
            .contains(&"export".to_string()));
        assert_eq!(admins[1].role, "admin");
        assert_eq!(admins[1].effective_permissions(), vec!["view", "reset"]);
    }
}
