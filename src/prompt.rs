//! Prompts for summarizing or questioning a news article.

use crate::{HuginnError, Result};

/// Longest article excerpt placed in a prompt, in characters.
pub const MAX_ARTICLE_CHARS: usize = 12_000;

const TRUNCATION_MARKER: &str = "\n[... article truncated ...]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Task {
    Summarize,
    Question(String),
}

/// A summarize or question-answering prompt over one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlePrompt {
    article: String,
    task: Task,
}

impl ArticlePrompt {
    /// Ask for a short summary of `article`.
    pub fn summarize(article: &str) -> Result<Self> {
        Ok(Self {
            article: prepare_article(article)?,
            task: Task::Summarize,
        })
    }

    /// Ask `question` about `article`.
    pub fn question(article: &str, question: &str) -> Result<Self> {
        let question = question.trim();
        if question.is_empty() {
            return Err(HuginnError::InvalidInput("question is empty".into()));
        }
        Ok(Self {
            article: prepare_article(article)?,
            task: Task::Question(question.to_string()),
        })
    }

    /// Whether the article had to be cut to fit.
    pub fn is_truncated(&self) -> bool {
        self.article.ends_with(TRUNCATION_MARKER)
    }

    pub fn render(&self) -> String {
        match &self.task {
            Task::Summarize => format!(
                "Summarize the following news article in a few concise bullet points. \
                 Stick to facts stated in the article.\n\nARTICLE:\n{}",
                self.article
            ),
            Task::Question(question) => format!(
                "Answer the question using only the news article below. \
                 If the article does not contain the answer, say so.\n\n\
                 ARTICLE:\n{}\n\nQUESTION:\n{}",
                self.article, question
            ),
        }
    }
}

/// Trim and cap article text at [`MAX_ARTICLE_CHARS`] on a char boundary.
fn prepare_article(article: &str) -> Result<String> {
    let article = article.trim();
    if article.is_empty() {
        return Err(HuginnError::InvalidInput("article text is empty".into()));
    }
    match article.char_indices().nth(MAX_ARTICLE_CHARS) {
        Some((cut, _)) => Ok(format!("{}{TRUNCATION_MARKER}", article[..cut].trim_end())),
        None => Ok(article.to_string()),
    }
}
