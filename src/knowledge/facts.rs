//! Static destination facts and FAQ

use crate::conversation::Language;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticFacts {
    pub location: &'static str,
    pub transport: &'static [&'static str],
    pub attractions: &'static [&'static str],
    pub activities: &'static [&'static str],
    pub season: &'static str,
    pub lodging: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Faq {
    pub question: &'static str,
    pub answer: &'static str,
}

const FACTS_EN: StaticFacts = StaticFacts {
    location: "Lembah Hijau Tourism Village sits in the highlands of West Java, about 1,200 m above sea level, 35 km south of Bandung.",
    transport: &[
        "From Bandung: 1.5 hours by car or ride-hailing via the Ciwidey road.",
        "Public transport: intercity bus to Ciwidey terminal, then a village shuttle (every hour, 07:00-17:00).",
        "Nearest airport: Husein Sastranegara (BDO), about 2 hours by car.",
    ],
    attractions: &[
        "Curug Hijau waterfall (30-minute trek)",
        "Tea plantation viewpoint at sunrise",
        "Situ Lembah lake with bamboo rafts",
        "Traditional Sundanese music house",
    ],
    activities: &[
        "Guided tea-picking and tea-processing workshop",
        "Rice-field trekking with local farmers",
        "Angklung and bamboo craft classes",
        "Cooking class for Sundanese dishes",
        "Camping by the lake",
    ],
    season: "Dry season (May-September) is the best time to visit; the rainy season (November-March) brings afternoon showers and cool nights around 15°C.",
    lodging: "Lodging is provided by family-run homestays in villagers' houses, each with breakfast and a local host; prices range from Rp150,000 to Rp600,000 per night.",
};

const FACTS_ID: StaticFacts = StaticFacts {
    location: "Desa Wisata Lembah Hijau berada di dataran tinggi Jawa Barat, sekitar 1.200 mdpl, 35 km di selatan Bandung.",
    transport: &[
        "Dari Bandung: 1,5 jam dengan mobil atau ojek daring melalui jalur Ciwidey.",
        "Transportasi umum: bus antarkota ke terminal Ciwidey, lalu shuttle desa (setiap jam, 07.00-17.00).",
        "Bandara terdekat: Husein Sastranegara (BDO), sekitar 2 jam dengan mobil.",
    ],
    attractions: &[
        "Air terjun Curug Hijau (trekking 30 menit)",
        "Titik pandang kebun teh saat matahari terbit",
        "Danau Situ Lembah dengan rakit bambu",
        "Rumah musik tradisional Sunda",
    ],
    activities: &[
        "Petik teh dan lokakarya pengolahan teh bersama pemandu",
        "Trekking sawah bersama petani lokal",
        "Kelas angklung dan kerajinan bambu",
        "Kelas memasak masakan Sunda",
        "Berkemah di tepi danau",
    ],
    season: "Musim kemarau (Mei-September) adalah waktu terbaik berkunjung; musim hujan (November-Maret) membawa hujan sore dan malam sejuk sekitar 15°C.",
    lodging: "Penginapan berupa homestay milik keluarga di rumah warga, lengkap dengan sarapan dan tuan rumah lokal; harga Rp150.000 hingga Rp600.000 per malam.",
};

const FAQ_EN: &[Faq] = &[
    Faq {
        question: "How do I book a homestay?",
        answer: "Open a homestay's page and press \"Book now\", or ask me to show available homestays.",
    },
    Faq {
        question: "Is breakfast included?",
        answer: "Yes, every homestay includes breakfast prepared by the host family.",
    },
    Faq {
        question: "Can I pay on arrival?",
        answer: "Bookings are confirmed after a bank transfer or e-wallet payment; the remainder can be paid on arrival.",
    },
    Faq {
        question: "Is there an entrance fee?",
        answer: "The village entrance fee is Rp10,000 per person; guided activities are priced separately.",
    },
];

const FAQ_ID: &[Faq] = &[
    Faq {
        question: "Bagaimana cara memesan homestay?",
        answer: "Buka halaman homestay lalu tekan \"Pesan sekarang\", atau minta saya menampilkan homestay yang tersedia.",
    },
    Faq {
        question: "Apakah termasuk sarapan?",
        answer: "Ya, setiap homestay sudah termasuk sarapan yang disiapkan keluarga tuan rumah.",
    },
    Faq {
        question: "Bisakah membayar saat tiba?",
        answer: "Pemesanan dikonfirmasi setelah transfer bank atau dompet digital; sisa pembayaran dapat dilunasi saat tiba.",
    },
    Faq {
        question: "Apakah ada tiket masuk?",
        answer: "Tiket masuk desa Rp10.000 per orang; aktivitas berpemandu dihitung terpisah.",
    },
];

pub fn static_facts(language: Language) -> StaticFacts {
    language.pick(FACTS_EN, FACTS_ID)
}

pub fn faqs(language: Language) -> Vec<Faq> {
    language.pick(FAQ_EN, FAQ_ID).to_vec()
}
