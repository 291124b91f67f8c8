use pillar_session::Axiom;

/// An axiom rendered as a two-sided card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
    pub axiom: Axiom,
    /// 1-based position
    pub index: usize,
    pub flipped: bool,
}

impl Flashcard {
    pub fn deck(axioms: &[Axiom]) -> Vec<Flashcard> {
        axioms
            .iter()
            .enumerate()
            .map(|(i, axiom)| Flashcard {
                axiom: axiom.clone(),
                index: i + 1,
                flipped: false,
            })
            .collect()
    }

    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    pub fn front(&self) -> &str {
        &self.axiom.title
    }

    pub fn back(&self) -> &str {
        &self.axiom.explanation
    }

    /// The side currently facing up
    pub fn face(&self) -> &str {
        if self.flipped {
            self.back()
        } else {
            self.front()
        }
    }
}
