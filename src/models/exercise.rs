/// 题目环境标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvTag {
    Ex,
    Bt,
    Vd,
}

impl EnvTag {
    /// 环境名
    pub fn name(self) -> &'static str {
        match self {
            EnvTag::Ex => "ex",
            EnvTag::Bt => "bt",
            EnvTag::Vd => "vd",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "ex" => Some(EnvTag::Ex),
            "bt" => Some(EnvTag::Bt),
            "vd" => Some(EnvTag::Vd),
            _ => None,
        }
    }

    /// `\begin{tag}`
    pub fn opening(self) -> String {
        format!("\\begin{{{}}}", self.name())
    }

    /// `\end{tag}`
    pub fn closing(self) -> String {
        format!("\\end{{{}}}", self.name())
    }
}

impl std::fmt::Display for EnvTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 文档中的一道题
///
/// `start`/`end` 是原文中的字节偏移，`end` 不包含。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseBlock {
    /// 含起止定界符的完整文本
    pub text: String,
    pub tag: EnvTag,
    pub start: usize,
    pub end: usize,
}

impl ExerciseBlock {
    /// 起始定界符的字节长度
    pub fn opening_len(&self) -> usize {
        self.tag.opening().len()
    }

    /// 去掉定界符并修剪空白后的题目内容
    pub fn body(&self) -> &str {
        let from = self.opening_len();
        let to = self.text.len().saturating_sub(self.tag.closing().len());
        self.text.get(from..to).unwrap_or(&self.text).trim()
    }
}
