use phf::phf_map;

/// 难度等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Difficulty {
    /// 识记
    N,
    /// 理解
    H,
    /// 应用
    V,
    /// 高阶应用
    C,
}

/// MapID 文件没有声明图例时使用的默认名称
static DEFAULT_LABELS: phf::Map<&'static str, &'static str> = phf_map! {
    "N" => "Nhận biết",
    "H" => "Thông hiểu",
    "V" => "Vận dụng",
    "C" => "Vận dụng cao",
};

impl Difficulty {
    /// 获取单字母代码
    pub fn code(self) -> &'static str {
        match self {
            Difficulty::N => "N",
            Difficulty::H => "H",
            Difficulty::V => "V",
            Difficulty::C => "C",
        }
    }

    /// 默认显示名称
    pub fn default_label(self) -> &'static str {
        DEFAULT_LABELS.get(self.code()).copied().unwrap_or("")
    }

    /// 从代码解析（精确匹配，区分大小写）
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "N" => Some(Difficulty::N),
            "H" => Some(Difficulty::H),
            "V" => Some(Difficulty::V),
            "C" => Some(Difficulty::C),
            _ => None,
        }
    }

    /// 先转成大写再解析，模型返回的小写代码也能接受
    pub fn normalize(s: &str) -> Option<Self> {
        Self::from_code(&s.trim().to_uppercase())
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
