//! Word abbreviation for long CBOR tag names.

/// Abbreviations applied to every semantics-derived name.
const COMMON: &[(&str, &str)] = &[
    ("standard", "std"),
    ("identifier", "id"),
    ("message", "msg"),
    ("configuration", "config"),
    ("reference", "ref"),
    ("referenced", "ref"),
    ("previously", "prev"),
];

/// Abbreviations applied once a name reaches [`LONG_NAME_LETTERS`].
const LONG: &[(&str, &str)] = &[
    ("number", "num"),
    ("complex", "cplx"),
    ("index", "idx"),
    ("attribute", "attr"),
    ("maximum", "max"),
    ("minimum", "min"),
    ("communication", "comm"),
    ("protocol", "proto"),
    ("information", "info"),
    ("authentication", "auth"),
    ("representation", "repr"),
    ("algorithm", "algo"),
    ("version", "ver"),
    ("encoding", "enc"),
    ("arguments", "arg"),
    ("object", "obj"),
    ("language", "lang"),
    ("independent", "indep"),
    ("alternatives", "alt"),
    ("text", "txt"),
    ("string", "str"),
    ("integer", "int"),
    ("signal", "sig"),
    ("channel", "chn"),
    ("structure", "strct"),
    ("structures", "strct"),
    ("attestation", "attest"),
    ("identify", "ident"),
    ("geographic", "geo"),
    ("geographical", "geo"),
    ("coordinate", "coord"),
    ("included", "inc"),
    ("value", "val"),
    ("values", "vals"),
    ("record", "rec"),
    ("report", "rpt"),
    ("definition", "def"),
    ("addressed", "addr"),
    ("capabilities", "cap"),
    ("additional", "add"),
    ("operation", "op"),
    ("operations", "op"),
    ("level", "lvl"),
    ("levels", "lvls"),
    ("encode", "enc"),
    ("encoded", "enc"),
    ("component", "comp"),
    ("condition", "cond"),
    ("database", "db"),
    ("element", "elem"),
    ("environment", "env"),
    ("parameter", "param"),
    ("variable", "var"),
    ("variables", "var"),
    ("resource", "res"),
    ("exception", "excpt"),
    ("instance", "inst"),
    ("organization", "org"),
    ("response", "resp"),
    ("security", "sec"),
];

/// Filler words dropped from long names.
const FILLER: &[&str] = &["and", "to", "a", "from", "the", "bare"];

/// Letter count from which long-name compression kicks in.
pub const LONG_NAME_LETTERS: usize = 40;

fn lookup(table: &[(&'static str, &'static str)], word: &str) -> Option<&'static str> {
    let lower = word.to_ascii_lowercase();
    table
        .iter()
        .find(|(long, _)| *long == lower)
        .map(|(_, short)| *short)
}

/// Abbreviate uppercase identifier words.
///
/// Common abbreviations always apply; the long table and filler removal only
/// when the words add up to [`LONG_NAME_LETTERS`] letters or more.
pub fn abbreviate(words: Vec<String>) -> Vec<String> {
    let words: Vec<String> = words
        .into_iter()
        .map(|w| lookup(COMMON, &w).map_or(w, str::to_ascii_uppercase))
        .collect();

    let letters: usize = words.iter().map(String::len).sum();
    if letters < LONG_NAME_LETTERS {
        return words;
    }

    let short: Vec<String> = words
        .iter()
        .map(|w| lookup(LONG, w).map_or_else(|| w.clone(), str::to_ascii_uppercase))
        .filter(|w| !FILLER.contains(&w.to_ascii_lowercase().as_str()))
        .collect();
    tracing::debug!(
        from = %words.join("_"),
        to = %short.join("_"),
        "Shortened long name"
    );
    short
}
