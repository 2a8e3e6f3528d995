use crate::model::MapEntry;

pub const DEFAULT_RESPAWN_SECS: u32 = 25 * 60 + 15;

fn entry(episode: u32, level: u32, name: &str, en_name: &str) -> MapEntry {
    MapEntry {
        episode,
        level,
        name: name.to_string(),
        en_name: en_name.to_string(),
        image_path: Some(format!("maps/{}.webp", name)),
        max_stages: 4,
        respawn_seconds: DEFAULT_RESPAWN_SECS,
        is_starred: false,
    }
}

/// The shipped catalog, already at the latest schema revision. Levels are
/// not unique: EP8 level 70 hosts two distinct maps.
pub fn builtin_entries() -> Vec<MapEntry> {
    vec![
        // EP1
        entry(1, 7, "夏奧雷伊礦山村莊", "Shaolei Mining Village"),
        entry(1, 9, "水晶礦山", "Crystal Mine"),
        // EP2
        entry(2, 12, "奈普里塔斯懸崖", "Nepritas Cliff"),
        entry(2, 13, "泰內花園", "Tenet Garden"),
        entry(2, 15, "泰內聖堂地下1層", "Tenet Church B1"),
        entry(2, 17, "泰內聖堂地上1層", "Tenet Church 1F"),
        entry(2, 19, "泰內聖堂地上2層", "Tenet Church 2F"),
        // EP3
        entry(3, 22, "達旦森林", "Dadan Forest"),
        entry(3, 24, "諾巴哈公會所", "Novaha Assembly Hall"),
        entry(3, 26, "諾巴哈別館", "Novaha Annex"),
        entry(3, 28, "諾巴哈本院", "Novaha Institute"),
        // EP4
        entry(4, 32, "科博爾特森林", "Kobolt Forest"),
        entry(4, 34, "賽堤尼山溝", "Settini Gorge"),
        entry(4, 36, "培爾克神殿", "Pelke Shrine"),
        entry(4, 38, "安森塔水源地", "Ansenta Waterhole"),
        // EP5
        entry(5, 44, "德慕爾佃農村", "Demel Tenant Village"),
        entry(5, 46, "德慕爾莊園", "Demel Manor"),
        entry(5, 48, "德慕爾外城", "Demel Outskirts"),
        // EP6
        entry(6, 52, "烏奇斯耕作地", "Uskis Arable Land"),
        entry(6, 53, "春光樹林", "Spring Light Woods"),
        entry(6, 55, "關口路", "Gateway Route"),
        entry(6, 57, "史爾特凱拉森林", "Srautas Forest"),
        entry(6, 59, "克巴伊拉斯森林", "Kvailas Forest"),
        // EP7
        entry(7, 62, "扎卡里耶爾交叉路", "Zachariel Crossroads"),
        entry(7, 64, "王陵1層", "Royal Mausoleum 1F"),
        entry(7, 66, "王陵2層", "Royal Mausoleum 2F"),
        entry(7, 68, "王陵3層", "Royal Mausoleum 3F"),
        // EP8
        entry(8, 70, "水路橋地區", "Aqueduct Bridge Area"),
        entry(8, 70, "阿雷魯諾男爵領", "Arelluno Barony"),
        entry(8, 71, "魔族收監所第1區", "Demon Prison District 1"),
        entry(8, 72, "魔族收監所第3區", "Demon Prison District 3"),
        entry(8, 73, "魔族收監所第4區", "Demon Prison District 4"),
        entry(8, 74, "魔族收監所第5區", "Demon Prison District 5"),
        // EP9
        entry(9, 75, "女神的古院", "Goddess' Ancient Garden"),
        entry(9, 76, "佩迪米安外城", "Fedimian Suburbs"),
        entry(9, 77, "魔法師之塔一層", "Mage Tower 1F"),
        entry(9, 78, "魔法師之塔二層", "Mage Tower 2F"),
        entry(9, 79, "魔法師之塔三層", "Mage Tower 3F"),
        // EP10
        entry(10, 80, "大教堂懺悔路", "Cathedral Penance Route"),
        entry(10, 81, "大教堂正殿", "Cathedral Main Hall"),
        entry(10, 82, "大教堂大迴廊", "Cathedral Great Corridor"),
        entry(10, 83, "大教堂至聖所", "Cathedral Sanctuary"),
    ]
}
