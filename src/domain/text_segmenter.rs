//! 文本分割器
//!
//! 将长文本切分为不超过最大长度的片段，优先在句末标点处断开。
//! 长度按字符（Unicode scalar）计算。

/// 默认最大片段长度
pub const DEFAULT_MAX_LENGTH: usize = 500;

/// 重组句子时补回的句末标点
pub const CANONICAL_TERMINATOR: char = '。';

/// 文本片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// 在原文中的顺序
    pub index: usize,
    /// 片段内容（非空）
    pub content: String,
}

impl TextChunk {
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// 检查是否为句末标点（全角与半角）
#[inline]
fn is_sentence_terminal(ch: char) -> bool {
    matches!(ch, '。' | '！' | '？' | '.' | '!' | '?')
}

/// 文本分割器
#[derive(Debug, Clone, Copy)]
pub struct TextSegmenter {
    max_length: usize,
}

impl Default for TextSegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LENGTH)
    }
}

impl TextSegmenter {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn segment(&self, text: &str) -> Vec<TextChunk> {
        segment_text(text, self.max_length)
    }
}

/// 对文本进行分段
///
/// 分段策略：
/// 1. 文本不超过 `max_length` 时原样返回一个片段（去除首尾空白）
/// 2. 否则按句末标点拆句，丢弃连续标点产生的空句
/// 3. 除拆分结果的最后一项外，每句补回 [`CANONICAL_TERMINATOR`]
/// 4. 贪心合并相邻句子，超出上限时开始新片段
///
/// 单句本身超过上限时独占一个片段，不做截断。
pub fn segment_text(text: &str, max_length: usize) -> Vec<TextChunk> {
    if text.chars().count() <= max_length {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        return vec![TextChunk {
            index: 0,
            content: trimmed.to_string(),
        }];
    }

    let pieces: Vec<&str> = text.split(is_sentence_terminal).collect();
    let last = pieces.len() - 1;

    let mut contents: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for (i, piece) in pieces.iter().enumerate() {
        if piece.trim().is_empty() {
            continue;
        }

        let mut sentence = piece.to_string();
        if i != last {
            sentence.push(CANONICAL_TERMINATOR);
        }
        let sentence_len = sentence.chars().count();

        if current_len + sentence_len <= max_length {
            current.push_str(&sentence);
            current_len += sentence_len;
        } else {
            push_trimmed(&mut contents, &current);
            current = sentence;
            current_len = sentence_len;
        }
    }
    push_trimmed(&mut contents, &current);

    contents
        .into_iter()
        .enumerate()
        .map(|(index, content)| TextChunk { index, content })
        .collect()
}

fn push_trimmed(contents: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        contents.push(trimmed.to_string());
    }
}

/// 解析按行分隔的文本列表（批量合成用）
///
/// 每行去除首尾空白，空行丢弃。
pub fn split_lines(texts: &str) -> Vec<String> {
    texts
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
