//! テンプレートカタログ
//!
//! 報告書の種類（floor / roof / combined）ごとのタイトルとチェック項目。
//! 固定データで、初回アクセス時に一度だけ検証される。

use std::sync::OnceLock;

use crate::types::{ChecklistGroup, ChecklistItem, Template};

pub const DEFAULT_TEMPLATE: &str = "floor";

type ItemDef = (&'static str, &'static str, &'static str);
type GroupDef = (&'static str, &'static str, &'static [ItemDef]);

const ROOF_CHECKLIST: &[GroupDef] = &[
    ("A", "Area Observed", &[
        ("A1", "Coal body already cleaned", "(Apakah body batubara sudah benar-benar dibersihkan +/- 10 cm bagian roof)"),
        ("A2", "Coal body already cleaned used cutting edge", "(Membersihkan batubara menggunakan excavator kecil dengan cutting edge/flat)"),
        ("A3", "There is no more parting and other non coal material", "(Tidak ada lagi sisipan dan material selain batubara di area tersebut)"),
        ("A4", "There is no water accumulation at loading area and coal body", "(Tidak ada genangan air di area penggalian dan badan batubara)"),
        ("A5", "At night shift must be supported by good lighting plant at coal getting area", "(Pada jadwal kerja malam, harus dibantu dengan lampu penerangan yang memadai di area penggalian batubara)"),
        ("A6", "There isn't spontaneous combustion at coal mining area", "(Tidak ada Swa Bakar pada area penambangan batubara)"),
        ("A7", "Volume coal expose is determined", "(Volume batubara terkupas sudah ditentukan)"),
        ("A8", "Location coal expose match with plan", "(Lokasi batubara terkupas sesuai rencana)"),
    ]),
    ("B", "Personel Attendance", &[
        ("B1", "Engineering, production & survey crew present for coal getting join inspection area", "(Eng, prod & survey hadir saat inspeksi gabungan dilokasi penggalian batubara)"),
    ]),
    ("C", "Survey Data for coal cleaning", &[
        ("C1", "Survey data for coal cleaning have been taken by surveyor (marked with tape)", "(Pengambilan data batubara yang sudah bersih telah dilakukan oleh team survey, ditandai dengan pita)"),
    ]),
];

const FLOOR_CHECKLIST: &[GroupDef] = &[
    ("A", "Area Observed", &[
        ("A1", "Coal body already mine", "(Apakah body batubara sudah benar-benar diambil)"),
    ]),
    ("B", "Coal Floor", &[
        ("B1", "Coal floor left +/- 10 cm", "(Batubara yang ditinggalkan setelah 10cm)"),
    ]),
    ("C", "Location Clean", &[
        ("C1", "There is no more coal pile left in the location", "(Tidak ada lagi tumpukan batubara tersisa dilokasi)"),
    ]),
    ("D", "Survey", &[
        ("D1", "Survey data for coal floor have been taken by surveyor (marked with tape)", "(Pengambilan data lantai batubara telah dilakukan oleh team survey, ditandai dengan pita)"),
    ]),
    ("E", "Personnel Attendance", &[
        ("E1", "Engineer, Production & Survey crew present for join mineout inspection area", "(Eng, Prod & Survey hadir di lokasi inspeksi bersama)"),
    ]),
];

/// Build groups from static definitions. `prefix` namespaces group and
/// item ids so two checklists can share one template.
fn build_groups(defs: &[GroupDef], prefix: Option<&str>) -> Vec<ChecklistGroup> {
    let id = |raw: &str| match prefix {
        Some(p) => format!("{}.{}", p, raw),
        None => raw.to_string(),
    };

    defs.iter()
        .map(|(group_id, title, items)| ChecklistGroup {
            id: id(group_id),
            title: title.to_string(),
            items: items
                .iter()
                .map(|(item_id, text, subtext)| ChecklistItem {
                    id: id(item_id),
                    text: text.to_string(),
                    subtext: subtext.to_string(),
                })
                .collect(),
        })
        .collect()
}

fn build_catalog() -> Vec<Template> {
    let mut combined = build_groups(ROOF_CHECKLIST, Some("roof"));
    combined.extend(build_groups(FLOOR_CHECKLIST, Some("floor")));

    vec![
        Template {
            key: "floor".to_string(),
            title: "PT BRE - PT KPP RANTAU PROJECT".to_string(),
            subtitle: "DAILY COAL MINEOUT/FLOOR INSPECTION & SIGN OFF\nRANTAU MINE".to_string(),
            groups: build_groups(FLOOR_CHECKLIST, None),
        },
        Template {
            key: "roof".to_string(),
            title: "Berita Acara Expose / Roof Inspection".to_string(),
            subtitle: "PT BRE – PT KPP (Project)".to_string(),
            groups: build_groups(ROOF_CHECKLIST, None),
        },
        Template {
            key: "combined".to_string(),
            title: "Berita Acara Gabungan Roof & Floor".to_string(),
            subtitle: "PT BRE – PT KPP (Project)".to_string(),
            groups: combined,
        },
    ]
}

static CATALOG: OnceLock<Vec<Template>> = OnceLock::new();

/// All templates, validated once on first access.
pub fn catalog() -> &'static [Template] {
    CATALOG.get_or_init(|| {
        let templates = build_catalog();
        for template in &templates {
            // 固定データなので検証失敗はビルド時の誤りを意味する
            if let Err(err) = template.validate() {
                panic!("built-in template catalog is invalid: {err}");
            }
        }
        templates
    })
}

pub fn find_template(key: &str) -> Option<&'static Template> {
    catalog().iter().find(|t| t.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_and_keys() {
        let keys: Vec<&str> = catalog().iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["floor", "roof", "combined"]);
    }

    #[test]
    fn test_catalog_all_valid() {
        for template in catalog() {
            assert!(template.validate().is_ok(), "{} invalid", template.key);
        }
    }

    #[test]
    fn test_item_counts() {
        assert_eq!(find_template("roof").unwrap().item_count(), 10);
        assert_eq!(find_template("floor").unwrap().item_count(), 5);
        assert_eq!(find_template("combined").unwrap().item_count(), 15);
    }

    #[test]
    fn test_combined_ids_are_namespaced() {
        let combined = find_template("combined").unwrap();
        let first = combined.items().next().unwrap();
        assert_eq!(first.id, "roof.A1");
        assert!(combined.contains_item("floor.A1"));
        assert!(!combined.contains_item("A1"));
    }

    #[test]
    fn test_floor_subtitle_has_two_lines() {
        let floor = find_template(DEFAULT_TEMPLATE).unwrap();
        assert_eq!(floor.subtitle_lines().count(), 2);
    }

    #[test]
    fn test_unknown_template() {
        assert!(find_template("wall").is_none());
    }
}
