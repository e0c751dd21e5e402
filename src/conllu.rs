/**
This module loads CoNLL-U files into the in-memory representation consumed by
the scorer. Loading also performs the structural validation the harness relies
on to classify bad system files: ten tab-separated columns, consecutive word
IDs, a single root per sentence and an acyclic HEAD graph. Each violation maps
to a distinct `UdError` variant so the caller can match on the failure kind
instead of sniffing message prefixes.
*/
use std::error::Error;
use std::fmt::Display;
use std::fs;
use std::path::Path;

/// A half-open range of offsets into `Corpus::characters`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A single syntactic word with its annotation columns. `head` is an index
/// into `Corpus::words`, or `None` for the sentence root.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub span: Span,
    pub form: String,
    pub lemma: String,
    pub upos: String,
    pub xpos: String,
    pub feats: String,
    pub head: Option<usize>,
    pub deprel: String,
}

/// A loaded treebank file. `characters` is the concatenation of the non-space
/// characters of every surface token, in order; token, word and sentence
/// spans index into it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    pub characters: Vec<char>,
    pub tokens: Vec<Span>,
    pub words: Vec<Word>,
    pub sentences: Vec<Span>,
}

impl Corpus {
    /// A corpus with no non-space characters at all.
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

/// Failure while loading a CoNLL-U file. The `MultipleRoots` and `Cycle`
/// variants are kept distinct from `Format` because the harness reports them
/// with dedicated status messages.
#[derive(Debug)]
pub enum UdError {
    Io(std::io::Error),
    Format(String),
    MultipleRoots,
    Cycle,
}

impl Display for UdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "Cannot open the CoNLL-U file: {}", err),
            Self::Format(msg) => write!(f, "Format error in the CoNLL-U file: {}", msg),
            Self::MultipleRoots => write!(f, "There are multiple roots in a sentence"),
            Self::Cycle => write!(f, "There is a cycle in a sentence"),
        }
    }
}
impl Error for UdError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}
impl From<std::io::Error> for UdError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

// Columns of a word line, before head resolution.
struct PendingWord {
    span: Span,
    form: String,
    lemma: String,
    upos: String,
    xpos: String,
    feats: String,
    raw_head: usize,
    deprel: String,
}

/// Loads and validates a CoNLL-U file from disk.
pub fn load_conllu_file<P: AsRef<Path>>(path: P) -> Result<Corpus, UdError> {
    let content = fs::read_to_string(path)?;
    parse_conllu(&content)
}

/// Parses and validates CoNLL-U content. Exposed separately from
/// `load_conllu_file` so the parsing rules can be tested without touching the
/// filesystem.
pub fn parse_conllu(content: &str) -> Result<Corpus, UdError> {
    let mut corpus = Corpus::default();
    let mut pending: Vec<PendingWord> = Vec::new();
    let mut sentence_char_start = 0usize;
    // End of the word ID range covered by the current multiword token, with
    // the surface span it contributed.
    let mut multiword: Option<(usize, Span)> = None;

    for line in content.lines() {
        if line.is_empty() {
            finalize_sentence(&mut corpus, &mut pending, sentence_char_start)?;
            sentence_char_start = corpus.characters.len();
            multiword = None;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() != 10 {
            return Err(UdError::Format(format!(
                "expected 10 tab-separated columns, got {}",
                columns.len()
            )));
        }
        let id = columns[0];
        if id.contains('.') {
            // Empty nodes take no part in the evaluation.
            continue;
        }
        if let Some((first, last)) = id.split_once('-') {
            let first: usize = parse_id(first)?;
            let last: usize = parse_id(last)?;
            if first > last || first != pending.len() + 1 {
                return Err(UdError::Format(format!(
                    "invalid multiword token range '{}'",
                    id
                )));
            }
            let span = push_form(&mut corpus, columns[1]);
            multiword = Some((last, span));
            continue;
        }
        let id: usize = parse_id(id)?;
        if id != pending.len() + 1 {
            return Err(UdError::Format(format!(
                "word ID {} does not follow ID {}",
                id,
                pending.len()
            )));
        }
        let span = match multiword {
            // Words inside a multiword token share its surface span and do
            // not contribute characters of their own.
            Some((last, span)) if id <= last => span,
            _ => push_form(&mut corpus, columns[1]),
        };
        let raw_head: usize = columns[6]
            .parse()
            .map_err(|_| UdError::Format(format!("HEAD '{}' is not a valid ID", columns[6])))?;
        pending.push(PendingWord {
            span,
            form: columns[1].to_string(),
            lemma: columns[2].to_string(),
            upos: columns[3].to_string(),
            xpos: columns[4].to_string(),
            feats: columns[5].to_string(),
            raw_head,
            deprel: columns[7].to_string(),
        });
    }
    finalize_sentence(&mut corpus, &mut pending, sentence_char_start)?;
    Ok(corpus)
}

fn parse_id(id: &str) -> Result<usize, UdError> {
    id.parse()
        .map_err(|_| UdError::Format(format!("'{}' is not a valid word ID", id)))
}

// Appends the non-space characters of a surface form and records its token
// span.
fn push_form(corpus: &mut Corpus, form: &str) -> Span {
    let start = corpus.characters.len();
    corpus
        .characters
        .extend(form.chars().filter(|c| !c.is_whitespace()));
    let span = Span {
        start,
        end: corpus.characters.len(),
    };
    corpus.tokens.push(span);
    span
}

// Validates the HEAD graph of one sentence and moves its words into the
// corpus with heads resolved to global word indices.
fn finalize_sentence(
    corpus: &mut Corpus,
    pending: &mut Vec<PendingWord>,
    sentence_char_start: usize,
) -> Result<(), UdError> {
    if pending.is_empty() {
        return Ok(());
    }
    let count = pending.len();
    for word in pending.iter() {
        if word.raw_head > count {
            return Err(UdError::Format(format!(
                "HEAD {} points outside a sentence of {} words",
                word.raw_head, count
            )));
        }
    }
    let roots = pending.iter().filter(|w| w.raw_head == 0).count();
    if roots == 0 {
        return Err(UdError::Format(String::from(
            "there is no root in a sentence",
        )));
    }
    if roots > 1 {
        return Err(UdError::MultipleRoots);
    }
    // Every head chain must reach the root in at most `count` steps.
    for start in 0..count {
        let mut current = start;
        let mut steps = 0;
        while pending[current].raw_head != 0 {
            current = pending[current].raw_head - 1;
            steps += 1;
            if steps > count {
                return Err(UdError::Cycle);
            }
        }
    }
    let base = corpus.words.len();
    for word in pending.drain(..) {
        let head = match word.raw_head {
            0 => None,
            h => Some(base + h - 1),
        };
        corpus.words.push(Word {
            span: word.span,
            form: word.form,
            lemma: word.lemma,
            upos: word.upos,
            xpos: word.xpos,
            feats: word.feats,
            head,
            deprel: word.deprel,
        });
    }
    corpus.sentences.push(Span {
        start: sentence_char_start,
        end: corpus.characters.len(),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(rows: &[&str]) -> String {
        let mut out = String::new();
        for row in rows {
            out.push_str(row);
            out.push('\n');
        }
        out.push('\n');
        out
    }

    #[test]
    fn test_parse_single_sentence() {
        let content = sentence(&[
            "# sent_id = 1",
            "1\tThe\tthe\tDET\tDT\tDefinite=Def\t2\tdet\t_\t_",
            "2\tcat\tcat\tNOUN\tNN\tNumber=Sing\t3\tnsubj\t_\t_",
            "3\tsleeps\tsleep\tVERB\tVBZ\tNumber=Sing\t0\troot\t_\t_",
        ]);
        let corpus = parse_conllu(&content).unwrap();
        let characters: String = corpus.characters.iter().collect();
        assert_eq!(characters, "Thecatsleeps");
        assert_eq!(corpus.words.len(), 3);
        assert_eq!(corpus.tokens.len(), 3);
        assert_eq!(corpus.sentences, vec![Span { start: 0, end: 12 }]);
        assert_eq!(corpus.words[0].head, Some(1));
        assert_eq!(corpus.words[2].head, None);
        assert_eq!(corpus.words[1].deprel, "nsubj");
    }

    #[test]
    fn test_multiword_token_shares_surface_span() {
        let content = sentence(&[
            "1-2\tdu\t_\t_\t_\t_\t_\t_\t_\t_",
            "1\tde\tde\tADP\t_\t_\t3\tcase\t_\t_",
            "2\tle\tle\tDET\t_\t_\t3\tdet\t_\t_",
            "3\tchat\tchat\tNOUN\t_\t_\t0\troot\t_\t_",
        ]);
        let corpus = parse_conllu(&content).unwrap();
        let characters: String = corpus.characters.iter().collect();
        assert_eq!(characters, "duchat");
        // Surface tokens: "du" and "chat".
        assert_eq!(corpus.tokens.len(), 2);
        assert_eq!(corpus.words.len(), 3);
        assert_eq!(corpus.words[0].span, corpus.words[1].span);
        assert_eq!(corpus.words[0].span, Span { start: 0, end: 2 });
        assert_eq!(corpus.words[2].span, Span { start: 2, end: 6 });
    }

    #[test]
    fn test_spaces_inside_forms_are_dropped() {
        let content = sentence(&["1\tNew York\tNew York\tPROPN\t_\t_\t0\troot\t_\t_"]);
        let corpus = parse_conllu(&content).unwrap();
        let characters: String = corpus.characters.iter().collect();
        assert_eq!(characters, "NewYork");
    }

    #[test]
    fn test_empty_nodes_are_skipped() {
        let content = sentence(&[
            "1\tSue\tSue\tPROPN\t_\t_\t2\tnsubj\t_\t_",
            "2\tlikes\tlike\tVERB\t_\t_\t0\troot\t_\t_",
            "2.1\tlikes\tlike\tVERB\t_\t_\t_\t_\t_\t_",
            "3\tcoffee\tcoffee\tNOUN\t_\t_\t2\tobj\t_\t_",
        ]);
        let corpus = parse_conllu(&content).unwrap();
        assert_eq!(corpus.words.len(), 3);
    }

    #[test]
    fn test_wrong_column_count_is_a_format_error() {
        let content = sentence(&["1\tcat\tcat\tNOUN\t_\t_\t0\troot"]);
        assert!(matches!(parse_conllu(&content), Err(UdError::Format(_))));
    }

    #[test]
    fn test_non_consecutive_ids_are_a_format_error() {
        let content = sentence(&[
            "1\ta\ta\tX\t_\t_\t0\troot\t_\t_",
            "3\tb\tb\tX\t_\t_\t1\tdep\t_\t_",
        ]);
        assert!(matches!(parse_conllu(&content), Err(UdError::Format(_))));
    }

    #[test]
    fn test_head_out_of_range_is_a_format_error() {
        let content = sentence(&["1\ta\ta\tX\t_\t_\t5\troot\t_\t_"]);
        assert!(matches!(parse_conllu(&content), Err(UdError::Format(_))));
    }

    #[test]
    fn test_missing_root_is_a_format_error() {
        let content = sentence(&[
            "1\ta\ta\tX\t_\t_\t2\tdep\t_\t_",
            "2\tb\tb\tX\t_\t_\t1\tdep\t_\t_",
        ]);
        assert!(matches!(parse_conllu(&content), Err(UdError::Format(_))));
    }

    #[test]
    fn test_multiple_roots_are_detected() {
        let content = sentence(&[
            "1\ta\ta\tX\t_\t_\t0\troot\t_\t_",
            "2\tb\tb\tX\t_\t_\t0\troot\t_\t_",
        ]);
        assert!(matches!(parse_conllu(&content), Err(UdError::MultipleRoots)));
    }

    #[test]
    fn test_cycles_are_detected() {
        let content = sentence(&[
            "1\ta\ta\tX\t_\t_\t2\tdep\t_\t_",
            "2\tb\tb\tX\t_\t_\t1\tdep\t_\t_",
            "3\tc\tc\tX\t_\t_\t0\troot\t_\t_",
        ]);
        assert!(matches!(parse_conllu(&content), Err(UdError::Cycle)));
    }

    #[test]
    fn test_empty_content_is_an_empty_corpus() {
        let corpus = parse_conllu("").unwrap();
        assert!(corpus.is_empty());
        assert!(corpus.sentences.is_empty());
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = load_conllu_file("definitely/not/a/file.conllu");
        assert!(matches!(result, Err(UdError::Io(_))));
    }
}
