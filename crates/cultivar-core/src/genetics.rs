//! Loci, alleles, and genotypes.
//!
//! A genotype maps each gene locus to a pair of alleles and never changes
//! after creation; plants and breeding records share genotypes behind an
//! `Arc`. Expression (how a locus shows up in the phenotype) lives in
//! [`crate::expression`]; this module only answers "what alleles are there
//! and what does the pair resolve to".

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Closed set of gene loci the engine models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneLocus {
    /// Stem elongation drive.
    Stature,
    /// Distance between branch nodes; tighter spacing bushes the canopy.
    InternodeSpacing,
    /// THC synthase activity.
    ThcSynthase,
    /// CBD synthase activity.
    CbdSynthase,
    /// Flower site density.
    BudDensity,
    /// Speed through the flowering window.
    FloweringTime,
    /// Root mass development.
    RootVigor,
    /// General tolerance of adverse conditions.
    Resilience,
}

impl GeneLocus {
    /// Every locus, in ordinal order.
    pub const ALL: [Self; 8] = [
        Self::Stature,
        Self::InternodeSpacing,
        Self::ThcSynthase,
        Self::CbdSynthase,
        Self::BudDensity,
        Self::FloweringTime,
        Self::RootVigor,
        Self::Resilience,
    ];

    /// Ordinal used to index static contribution tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Stature => 0,
            Self::InternodeSpacing => 1,
            Self::ThcSynthase => 2,
            Self::CbdSynthase => 3,
            Self::BudDensity => 4,
            Self::FloweringTime => 5,
            Self::RootVigor => 6,
            Self::Resilience => 7,
        }
    }
}

/// One inherited allele.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Allele {
    /// How strongly the allele drives its locus, in `[0, 1]`.
    pub strength: f32,
    /// Weight of this allele when the pair is resolved, in `[0, 1]`.
    pub dominance: f32,
}

impl Allele {
    /// Construct an allele, clamping both fields into `[0, 1]`.
    #[must_use]
    pub fn new(strength: f32, dominance: f32) -> Self {
        Self {
            strength: strength.clamp(0.0, 1.0),
            dominance: dominance.clamp(0.0, 1.0),
        }
    }

    /// Neutral allele used when a locus is absent from a genotype.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            strength: 0.5,
            dominance: 0.5,
        }
    }

    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            strength: rng.random_range(0.0..=1.0),
            dominance: rng.random_range(0.0..=1.0),
        }
    }

    fn mutated<R: Rng + ?Sized>(self, rng: &mut R, amplitude: f32) -> Self {
        Self::new(
            self.strength + rng.random_range(-amplitude..=amplitude),
            self.dominance + rng.random_range(-amplitude..=amplitude),
        )
    }
}

/// Maternal/paternal allele pair at one locus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllelePair {
    pub maternal: Allele,
    pub paternal: Allele,
}

impl AllelePair {
    /// Construct a pair from both inherited alleles.
    #[must_use]
    pub const fn new(maternal: Allele, paternal: Allele) -> Self {
        Self { maternal, paternal }
    }

    /// Homozygous pair carrying the same allele twice.
    #[must_use]
    pub const fn homozygous(allele: Allele) -> Self {
        Self {
            maternal: allele,
            paternal: allele,
        }
    }

    /// Resolve the pair into a single expressed strength in `[0, 1]`.
    ///
    /// Dominance-weighted average; a pair of fully recessive alleles falls
    /// back to the plain mean so the locus still expresses.
    #[must_use]
    pub fn expressed(&self) -> f32 {
        let weight = self.maternal.dominance + self.paternal.dominance;
        if weight <= f32::EPSILON {
            return (self.maternal.strength + self.paternal.strength) * 0.5;
        }
        (self.maternal.strength * self.maternal.dominance
            + self.paternal.strength * self.paternal.dominance)
            / weight
    }
}

impl Default for AllelePair {
    fn default() -> Self {
        Self::homozygous(Allele::neutral())
    }
}

/// Mutation amplitude applied per inherited allele during a cross.
const CROSS_MUTATION_AMPLITUDE: f32 = 0.1;
/// Chance that an inherited allele mutates during a cross.
const CROSS_MUTATION_RATE: f64 = 0.08;

/// Immutable mapping from locus to allele pair, stored ordinal-indexed so
/// walks are deterministic and allocation-free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genotype {
    loci: [AllelePair; GeneLocus::ALL.len()],
}

impl Default for Genotype {
    fn default() -> Self {
        Self::balanced()
    }
}

impl Genotype {
    /// Genotype with every locus at the neutral pair.
    #[must_use]
    pub fn balanced() -> Self {
        Self {
            loci: [AllelePair::default(); GeneLocus::ALL.len()],
        }
    }

    /// Fully randomized genotype across all loci.
    #[must_use]
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            loci: GeneLocus::ALL
                .map(|_| AllelePair::new(Allele::random(rng), Allele::random(rng))),
        }
    }

    /// Build a genotype from explicit pairs; unnamed loci stay neutral.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (GeneLocus, AllelePair)>) -> Self {
        let mut genotype = Self::balanced();
        for (locus, pair) in pairs {
            genotype.loci[locus.index()] = pair;
        }
        genotype
    }

    /// Cross two parents: each child locus inherits one allele from each
    /// parent (chosen uniformly from that parent's pair) with a small
    /// mutation chance per allele.
    #[must_use]
    pub fn cross<R: Rng + ?Sized>(mother: &Self, father: &Self, rng: &mut R) -> Self {
        Self {
            loci: GeneLocus::ALL.map(|locus| {
                let from_mother = pick_allele(mother.pair(locus), rng);
                let from_father = pick_allele(father.pair(locus), rng);
                AllelePair::new(maybe_mutate(from_mother, rng), maybe_mutate(from_father, rng))
            }),
        }
    }

    /// Allele pair at a locus.
    #[must_use]
    pub fn pair(&self, locus: GeneLocus) -> AllelePair {
        self.loci[locus.index()]
    }

    /// Expressed strength at a locus.
    #[must_use]
    pub fn expressed(&self, locus: GeneLocus) -> f32 {
        self.pair(locus).expressed()
    }

    /// Iterate over all locus/pair entries in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = (GeneLocus, AllelePair)> + '_ {
        GeneLocus::ALL
            .into_iter()
            .map(move |locus| (locus, self.loci[locus.index()]))
    }

    /// Root-mean-square distance between the expressed strengths of two
    /// genotypes; breeding UIs use it to gauge strain divergence.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        let mut sum = 0.0;
        for locus in GeneLocus::ALL {
            let diff = self.expressed(locus) - other.expressed(locus);
            sum += diff * diff;
        }
        (sum / GeneLocus::ALL.len() as f32).sqrt()
    }
}

fn pick_allele<R: Rng + ?Sized>(pair: AllelePair, rng: &mut R) -> Allele {
    if rng.random_bool(0.5) {
        pair.maternal
    } else {
        pair.paternal
    }
}

fn maybe_mutate<R: Rng + ?Sized>(allele: Allele, rng: &mut R) -> Allele {
    if rng.random_bool(CROSS_MUTATION_RATE) {
        allele.mutated(rng, CROSS_MUTATION_AMPLITUDE)
    } else {
        allele
    }
}
