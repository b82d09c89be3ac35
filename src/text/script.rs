//! Static Traditional/Simplified conversion tables / 繁简转换静态映射表
//!
//! Plain per-character substitution, not translation. Several Traditional
//! characters collapse onto one Simplified character (發/髮 → 发), so
//! converting back and forth is NOT guaranteed to reproduce the input;
//! the reverse table is built first-mapping-wins and is best-effort only.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Conversion direction. / 转换方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToSimplified,
    ToTraditional,
}

/// (Traditional, Simplified) pairs for common characters, weighted toward
/// item-catalog vocabulary (materials, gear, crafting terms). / 常用字对照表
const TRAD_SIMP_PAIRS: &[(char, char)] = &[
    ('國', '国'), ('學', '学'), ('書', '书'), ('電', '电'), ('話', '话'),
    ('語', '语'), ('說', '说'), ('讀', '读'), ('寫', '写'), ('聽', '听'),
    ('見', '见'), ('視', '视'), ('觀', '观'), ('開', '开'), ('關', '关'),
    ('門', '门'), ('間', '间'), ('問', '问'), ('時', '时'), ('當', '当'),
    ('會', '会'), ('應', '应'), ('對', '对'), ('為', '为'), ('無', '无'),
    ('從', '从'), ('來', '来'), ('後', '后'), ('發', '发'), ('髮', '发'),
    ('動', '动'), ('機', '机'), ('車', '车'), ('號', '号'), ('業', '业'),
    ('產', '产'), ('員', '员'), ('務', '务'), ('經', '经'), ('濟', '济'),
    ('場', '场'), ('廠', '厂'), ('區', '区'), ('縣', '县'), ('鄉', '乡'),
    ('鎮', '镇'), ('東', '东'), ('風', '风'), ('雲', '云'), ('長', '长'),
    ('廣', '广'), ('遠', '远'), ('進', '进'), ('過', '过'), ('還', '还'),
    ('運', '运'), ('報', '报'), ('紙', '纸'), ('記', '记'), ('誌', '志'),
    ('網', '网'), ('頁', '页'), ('圖', '图'), ('畫', '画'), ('聲', '声'),
    ('樂', '乐'), ('藝', '艺'), ('術', '术'), ('體', '体'), ('愛', '爱'),
    ('實', '实'), ('現', '现'), ('夢', '梦'), ('裡', '里'), ('裏', '里'),
    ('頭', '头'), ('臉', '脸'), ('點', '点'), ('線', '线'), ('邊', '边'),
    ('連', '连'), ('錢', '钱'), ('買', '买'), ('賣', '卖'), ('價', '价'),
    ('質', '质'), ('費', '费'), ('級', '级'), ('類', '类'), ('種', '种'),
    ('樣', '样'), ('數', '数'), ('統', '统'), ('計', '计'), ('設', '设'),
    ('備', '备'), ('處', '处'), ('辦', '办'), ('總', '总'), ('結', '结'),
    ('組', '组'), ('織', '织'), ('係', '系'), ('聯', '联'), ('歷', '历'),
    ('認', '认'), ('識', '识'), ('證', '证'), ('據', '据'), ('論', '论'),
    ('談', '谈'), ('議', '议'), ('選', '选'), ('決', '决'), ('權', '权'),
    ('黨', '党'), ('軍', '军'), ('戰', '战'), ('鬥', '斗'), ('勝', '胜'),
    ('敗', '败'), ('條', '条'), ('規', '规'), ('則', '则'), ('標', '标'),
    ('準', '准'), ('廳', '厅'), ('館', '馆'), ('樓', '楼'), ('臺', '台'),
    ('燈', '灯'), ('裝', '装'), ('雜', '杂'), ('難', '难'), ('專', '专'),
    ('師', '师'), ('醫', '医'), ('藥', '药'), ('導', '导'), ('養', '养'),
    ('習', '习'), ('練', '练'),
    // 道具目录高频字 / high-frequency catalog characters
    ('鋼', '钢'), ('鐵', '铁'), ('銅', '铜'), ('銀', '银'), ('錫', '锡'),
    ('鉛', '铅'), ('礦', '矿'), ('鹽', '盐'), ('麥', '麦'), ('麵', '面'),
    ('絲', '丝'), ('綢', '绸'), ('革', '革'), ('獸', '兽'),
    ('鳥', '鸟'), ('魚', '鱼'), ('龍', '龙'), ('鳳', '凤'), ('劍', '剑'),
    ('槍', '枪'), ('盾', '盾'), ('錘', '锤'), ('鋸', '锯'), ('針', '针'),
    ('釘', '钉'), ('鍋', '锅'), ('製', '制'), ('煉', '炼'), ('鍛', '锻'),
    ('鑄', '铸'), ('寶', '宝'), ('鑽', '钻'), ('綠', '绿'), ('紅', '红'),
    ('藍', '蓝'), ('黃', '黄'), ('紫', '紫'), ('黑', '黑'), ('靈', '灵'),
    ('魂', '魂'), ('獵', '猎'), ('騎', '骑'), ('馬', '马'), ('鞍', '鞍'),
];

static TRAD_TO_SIMP: Lazy<HashMap<char, char>> = Lazy::new(|| {
    TRAD_SIMP_PAIRS
        .iter()
        .filter(|(t, s)| t != s)
        .copied()
        .collect()
});

/// Reverse table. Where several Traditional characters map to the same
/// Simplified one, the first pair in the list wins. / 反向表，多对一时取首个
static SIMP_TO_TRAD: Lazy<HashMap<char, char>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for &(t, s) in TRAD_SIMP_PAIRS.iter().filter(|(t, s)| t != s) {
        map.entry(s).or_insert(t);
    }
    map
});

/// Convert text by per-character table lookup; unmapped characters pass
/// through unchanged. / 逐字转换，不在表中的字符原样保留
pub fn convert(text: &str, direction: Direction) -> String {
    let table: &HashMap<char, char> = match direction {
        Direction::ToSimplified => &TRAD_TO_SIMP,
        Direction::ToTraditional => &SIMP_TO_TRAD,
    };
    text.chars()
        .map(|c| table.get(&c).copied().unwrap_or(c))
        .collect()
}

pub(crate) fn is_traditional_char(c: char) -> bool {
    TRAD_TO_SIMP.contains_key(&c)
}

pub(crate) fn is_simplified_char(c: char) -> bool {
    SIMP_TO_TRAD.contains_key(&c)
}
