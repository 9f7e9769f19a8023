use rust_decimal::Decimal;

use crate::domain::item::{Item, ItemId, SurfaceAffinity, Tier};

struct ItemSpec {
    id: &'static str,
    name: &'static str,
    tier: Tier,
    price_cents: i64,
    material: &'static str,
    size: &'static str,
    description: &'static str,
    surface: SurfaceAffinity,
    image: &'static str,
    features: &'static [&'static str],
}

impl ItemSpec {
    fn build(&self) -> Item {
        Item {
            id: ItemId(self.id.to_owned()),
            name: self.name.to_owned(),
            tier: self.tier,
            price: Decimal::new(self.price_cents, 2),
            material: self.material.to_owned(),
            size: self.size.to_owned(),
            description: self.description.to_owned(),
            surface: self.surface,
            image: self.image.to_owned(),
            features: self.features.iter().map(|feature| (*feature).to_owned()).collect(),
        }
    }
}

// Display order within a tier follows declaration order.
const ITEMS: &[ItemSpec] = &[
    ItemSpec {
        id: "erima-pure-grip-4",
        name: "Erima Pure Grip No. 4 Handball",
        tier: Tier::Novice,
        price_cents: 2_999,
        material: "Synthetic leather with Pure Grip coating",
        size: "0 (48-50 cm)",
        description: "An ideal training ball for beginners and kids. The Pure Grip coating gives \
                      better ball control.",
        surface: SurfaceAffinity::Universal,
        image: "novice/erima_pure_grip_4.jpg",
        features: &[
            "Pure Grip technology for better grip",
            "Size 0 suits kids and beginners",
            "Durable synthetic leather",
            "Excellent ball control",
            "Works on every surface",
        ],
    },
    ItemSpec {
        id: "molten-h00f1800",
        name: "Molten Handball H00F1800",
        tier: Tier::Novice,
        price_cents: 2_499,
        material: "Soft synthetic leather",
        size: "0 (48-50 cm)",
        description: "A light, comfortable ball for young players. Made for kids' practice and \
                      building basic skills.",
        surface: SurfaceAffinity::Indoor,
        image: "novice/molten_h0f1800.jpg",
        features: &[
            "Soft surface for comfortable play",
            "Size 0 for young athletes",
            "Good grip",
            "Stable flight path",
            "Best in the hall",
        ],
    },
    ItemSpec {
        id: "select-tucana-db-v24",
        name: "Select Tucana DB v24 Handball",
        tier: Tier::Novice,
        price_cents: 2_799,
        material: "HPU with dual bonding",
        size: "1 (50-52 cm)",
        description: "A dual-bonded training ball for older beginners. Gives excellent control and \
                      accurate passing.",
        surface: SurfaceAffinity::Universal,
        image: "novice/select_tucana.jpg",
        features: &[
            "DB dual bonding technology",
            "Size 1 for older players",
            "Improved control",
            "High wear resistance",
            "Universal use",
        ],
    },
    ItemSpec {
        id: "select-replica-ehf-v24",
        name: "Select Replica EHF European League v24",
        tier: Tier::Intermediate,
        price_cents: 4_999,
        material: "HPU 1700 with microfiber",
        size: "1-2-3",
        description: "A replica of the official European League ball. Available in several sizes \
                      for different age groups.",
        surface: SurfaceAffinity::Indoor,
        image: "intermediate/select_replica_ehf.jpg",
        features: &[
            "Official EHF ball design",
            "Size to match the player's age",
            "Superior grip",
            "Controlled bounce",
            "High durability",
        ],
    },
    ItemSpec {
        id: "molten-schoolmaster",
        name: "Molten SchoolMasteR Handball",
        tier: Tier::Intermediate,
        price_cents: 4_299,
        material: "PRO synthetic leather",
        size: "1-2-3",
        description: "A professional training ball for schools and clubs. Fits regular practice \
                      and competition.",
        surface: SurfaceAffinity::Universal,
        image: "intermediate/molten_schoolmaster.jpg",
        features: &[
            "PRO coating",
            "Three size options",
            "Stable shape",
            "Improved bounce",
            "Long service life",
        ],
    },
    ItemSpec {
        id: "erima-vranjes",
        name: "Erima Vranjes",
        tier: Tier::Intermediate,
        price_cents: 4_599,
        material: "Premium synthetic leather",
        size: "1-2-3",
        description: "A versatile mid-level ball for practice and matches. Gives excellent control \
                      and accuracy.",
        surface: SurfaceAffinity::Universal,
        image: "intermediate/erima_vranjes.jpg",
        features: &[
            "Premium coating",
            "Sizes for every age",
            "Excellent grip",
            "Accurate flight path",
            "Extra durability",
        ],
    },
    // Competition balls are certified for hall play only.
    ItemSpec {
        id: "erima-pure-grip-1",
        name: "Erima Pure Grip No. 1 Handball",
        tier: Tier::Professional,
        price_cents: 7_999,
        material: "Premium Pro+ synthetic leather",
        size: "2-3",
        description: "A top-class professional ball with Pure Grip Pro+ technology. Used in \
                      professional competitions.",
        surface: SurfaceAffinity::Indoor,
        image: "professional/erima_pure_grip_1.jpg",
        features: &[
            "Pure Grip Pro+ technology",
            "Professional sizes 2-3",
            "Maximum grip",
            "Ideal balance",
            "Competition standard",
        ],
    },
    ItemSpec {
        id: "molten-h3x5001-bw",
        name: "Molten H3X5001-BW Handball",
        tier: Tier::Professional,
        price_cents: 8_499,
        material: "Premium X5000 composite leather",
        size: "2-3",
        description: "Official IHF match ball for top-level professional competitions. Certified \
                      for international tournaments.",
        surface: SurfaceAffinity::Indoor,
        image: "professional/molten_h3x5001.jpg",
        features: &[
            "IHF certified",
            "X5000 Premium technology",
            "Professional sizes",
            "Superior aerodynamics",
            "Highest accuracy",
        ],
    },
    ItemSpec {
        id: "select-ultimate-ehf-cl-v24",
        name: "Select Ultimate EHF Champions League v24",
        tier: Tier::Professional,
        price_cents: 8_999,
        material: "Shark Skin with microfiber",
        size: "2-3",
        description: "Official EHF Champions League ball. The quality benchmark for professional \
                      handball.",
        surface: SurfaceAffinity::Indoor,
        image: "professional/select_ultimate_cl.jpg",
        features: &[
            "Official EHF ball",
            "Shark Skin technology",
            "Optimal weight and balance",
            "Exceptional grip",
            "Maximum wear resistance",
        ],
    },
];

pub(crate) fn builtin_items() -> Vec<Item> {
    ITEMS.iter().map(ItemSpec::build).collect()
}
