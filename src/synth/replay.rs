use log::debug;

use crate::error::{Result, SearchExhausted};
use crate::expr::Program;
use crate::sexp::parse_program;
use crate::spec::{ProgramSignature, Spec};

use super::Enumerator;

/// This enumerator simply tries a fixed list of programs, in order.
/// Used to re-check stored solutions against fresh examples.
pub struct ReplayEnum {
    db: Vec<Program>,
    last_tried: usize,
}

impl ReplayEnum {
    pub fn new(db: Vec<Program>) -> Self {
        Self {
            db,
            last_tried: 0,
        }
    }

    /// Loads programs from their stored text form.
    pub fn from_sexps<'a>(
        spec: &Spec,
        sig: &ProgramSignature,
        texts: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let db = texts.into_iter()
            .map(|text| parse_program(spec, sig, text))
            .collect::<Result<Vec<_>>>()?;

        debug!("Replaying {} programs", db.len());

        Ok(Self::new(db))
    }
}

impl Enumerator for ReplayEnum {
    fn next_expr(&mut self) -> std::result::Result<Program, SearchExhausted> {
        match self.db.get(self.last_tried) {
            None => Err(SearchExhausted),
            Some(x) => {
                self.last_tried += 1;
                Ok(x.clone())
            },
        }
    }
}
