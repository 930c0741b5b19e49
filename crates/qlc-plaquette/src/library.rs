//! Rotated CSS surface-code plaquettes.
//!
//! Every plaquette round spans six moments: syndrome reset, four `CX` layers
//! and the syndrome measurement. X-type plaquettes visit their data qubits in
//! the order TL, TR, BL, BR while Z-type plaquettes use TL, BL, TR, BR, which
//! keeps neighbouring plaquettes collision-free.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

use itertools::Itertools;
use qlc_circuit::{Gate, GridQubit, Instruction, Moment, ScheduledCircuit};
use qlc_core::{Basis, QlcError};
use serde::{Deserialize, Serialize};

use crate::plaquette::{Plaquette, Plaquettes};
use crate::template::RectangularTemplate;

/// Number of moments of one plaquette round.
pub const PLAQUETTE_ROUND_MOMENTS: usize = 6;

/// Data-qubit corner of a plaquette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Corner {
    /// `(-1, -1)`.
    TopLeft,
    /// `(1, -1)`.
    TopRight,
    /// `(-1, 1)`.
    BottomLeft,
    /// `(1, 1)`.
    BottomRight,
}

impl Corner {
    /// The four corners.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Local coordinates of the data qubit.
    pub fn qubit(&self) -> GridQubit {
        match self {
            Corner::TopLeft => GridQubit::new(-1, -1),
            Corner::TopRight => GridQubit::new(1, -1),
            Corner::BottomLeft => GridQubit::new(-1, 1),
            Corner::BottomRight => GridQubit::new(1, 1),
        }
    }

    /// Diagonally opposite corner.
    pub fn opposite(&self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Corner::TopLeft => "TL",
            Corner::TopRight => "TR",
            Corner::BottomLeft => "BL",
            Corner::BottomRight => "BR",
        }
    }

    // Clockwise rank, so polygons are drawn without self-intersection.
    fn drawing_rank(&self) -> u8 {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomRight => 2,
            Corner::BottomLeft => 3,
        }
    }
}

/// Role of a round in the lifetime of a logical patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoundKind {
    /// Data qubits are reset in the basis before the round.
    Initialization(Basis),
    /// Plain stabilizer measurement round.
    Memory,
    /// Memory round ending with a transversal Hadamard on the data qubits.
    Hadamard,
    /// Data qubits are measured in the basis at the end of the round.
    Measurement(Basis),
}

impl RoundKind {
    fn touches_data(&self) -> bool {
        !matches!(self, RoundKind::Memory)
    }
}

impl Display for RoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundKind::Initialization(basis) => write!(f, "init-{basis}"),
            RoundKind::Memory => f.write_str("memory"),
            RoundKind::Hadamard => f.write_str("hadamard"),
            RoundKind::Measurement(basis) => write!(f, "measure-{basis}"),
        }
    }
}

/// Builds the CSS plaquette measuring the `basis` stabilizer on `corners`.
pub fn css_plaquette(
    basis: Basis,
    corners: &[Corner],
    round: RoundKind,
) -> Result<Plaquette, QlcError> {
    css_plaquette_on(basis, corners, corners, round)
}

/// Builds the CSS plaquette measuring the `basis` stabilizer on `corners`,
/// restricting the data-qubit operations of `round` to the `owned` corners.
///
/// Plaquettes of a pipe share their outer data qubits with the cubes it joins;
/// only the cube resets, measures or rotates those.
pub fn css_plaquette_on(
    basis: Basis,
    corners: &[Corner],
    owned: &[Corner],
    round: RoundKind,
) -> Result<Plaquette, QlcError> {
    let corners: Vec<Corner> = corners.iter().copied().sorted().dedup().collect();
    let owned: Vec<Corner> = owned
        .iter()
        .copied()
        .filter(|corner| corners.contains(corner))
        .sorted()
        .dedup()
        .collect();
    let syndrome = GridQubit::new(0, 0);
    let mut moments = Vec::with_capacity(PLAQUETTE_ROUND_MOMENTS);

    let mut resets = vec![Instruction::single(Gate::reset(basis), syndrome)];
    if let RoundKind::Initialization(data_basis) = round {
        resets.extend(
            owned
                .iter()
                .map(|corner| Instruction::single(Gate::reset(data_basis), corner.qubit())),
        );
    }
    moments.push(Moment::new(resets)?);

    let order = match basis {
        Basis::X => [
            Corner::TopLeft,
            Corner::TopRight,
            Corner::BottomLeft,
            Corner::BottomRight,
        ],
        Basis::Z => [
            Corner::TopLeft,
            Corner::BottomLeft,
            Corner::TopRight,
            Corner::BottomRight,
        ],
    };
    for corner in order {
        if !corners.contains(&corner) {
            moments.push(Moment::empty());
            continue;
        }
        let cx = match basis {
            Basis::X => Instruction::pair(Gate::CX, syndrome, corner.qubit())?,
            Basis::Z => Instruction::pair(Gate::CX, corner.qubit(), syndrome)?,
        };
        moments.push(Moment::new(vec![cx])?);
    }

    let mut last = vec![Instruction::single(Gate::measurement(basis), syndrome)];
    match round {
        RoundKind::Measurement(data_basis) => last.extend(
            owned
                .iter()
                .map(|corner| Instruction::single(Gate::measurement(data_basis), corner.qubit())),
        ),
        RoundKind::Hadamard => last.extend(
            owned
                .iter()
                .map(|corner| Instruction::single(Gate::H, corner.qubit())),
        ),
        RoundKind::Initialization(_) | RoundKind::Memory => {}
    }
    moments.push(Moment::new(last)?);

    let mut name = format!(
        "css-{basis}-{}-{round}",
        corners.iter().map(Corner::label).join(".")
    );
    if round.touches_data() && owned != corners {
        if owned.is_empty() {
            name.push_str("@none");
        } else {
            name.push('@');
            name.push_str(&owned.iter().map(Corner::label).join("."));
        }
    }
    let data_qubits = corners
        .iter()
        .sorted_by_key(|corner| corner.drawing_rank())
        .map(Corner::qubit)
        .collect();
    Ok(Plaquette::new(
        name,
        vec![syndrome],
        data_qubits,
        ScheduledCircuit::from_moments(moments),
        Some(basis),
    ))
}

/// Stabilizer bases of one patch element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatchBases {
    /// Basis of the bulk plaquettes on even cells of the global checkerboard.
    pub even: Basis,
    /// Basis of the half plaquettes on the left and right walls.
    pub vertical_walls: Basis,
    /// Basis of the half plaquettes on the top and bottom walls.
    pub horizontal_walls: Basis,
}

impl PatchBases {
    /// Square patch whose left and right walls measure `orientation`.
    pub fn oriented(orientation: Basis) -> Self {
        Self {
            even: orientation.flipped(),
            vertical_walls: orientation,
            horizontal_walls: orientation.flipped(),
        }
    }

    fn on_parity(&self, even: bool) -> Basis {
        if even {
            self.even
        } else {
            self.even.flipped()
        }
    }
}

/// Bases of a patch element and the template corners where spatial pipes meet.
///
/// A junction corner on a cube keeps its corner bulk plaquette whole; on a
/// pipe it turns the concave corner cell into a weight-three plaquette or
/// leaves it empty, depending on the checkerboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatchLayout {
    /// Stabilizer bases.
    pub bases: PatchBases,
    /// Template corners touching a junction.
    pub junctions: BTreeSet<Corner>,
}

impl PatchLayout {
    /// Layout without junctions.
    pub fn new(bases: PatchBases) -> Self {
        Self {
            bases,
            junctions: BTreeSet::new(),
        }
    }

    /// Marks `corner` as touching a junction.
    pub fn with_junction(mut self, corner: Corner) -> Self {
        self.junctions.insert(corner);
        self
    }
}

struct Entry {
    index: usize,
    basis: Basis,
    corners: Vec<Corner>,
    owned: Vec<Corner>,
}

/// Plaquettes implementing one round of `round` on `template`.
///
/// `orientation` is the stabilizer basis of the half plaquettes on the left and
/// right sides of a square patch; the top and bottom sides use the other basis.
/// Indices left out of the returned collection are empty plaquettes.
pub fn surface_code_plaquettes(
    template: RectangularTemplate,
    orientation: Basis,
    round: RoundKind,
) -> Result<Plaquettes, QlcError> {
    patch_plaquettes(
        template,
        &PatchLayout::new(PatchBases::oriented(orientation)),
        round,
    )
}

/// Plaquettes implementing one round of `round` on a `template` element laid
/// out as `layout`.
pub fn patch_plaquettes(
    template: RectangularTemplate,
    layout: &PatchLayout,
    round: RoundKind,
) -> Result<Plaquettes, QlcError> {
    use Corner::*;
    let bases = layout.bases;
    let even = bases.even;
    let odd = even.flipped();
    let bulk = Corner::ALL.to_vec();
    let top = vec![TopLeft, TopRight];
    let bottom = vec![BottomLeft, BottomRight];
    let left = vec![TopLeft, BottomLeft];
    let right = vec![TopRight, BottomRight];
    let whole = |index: usize, basis: Basis, corners: &[Corner]| Entry {
        index,
        basis,
        corners: corners.to_vec(),
        owned: corners.to_vec(),
    };

    let mut entries: Vec<Entry> = Vec::new();
    match template {
        RectangularTemplate::Qubit | RectangularTemplate::SpatialQubit => {
            let horizontal = bases.horizontal_walls;
            let vertical = bases.vertical_walls;
            entries.push(whole(if horizontal == even { 6 } else { 5 }, horizontal, &bottom));
            entries.push(whole(if horizontal == even { 13 } else { 14 }, horizontal, &top));
            entries.push(whole(if vertical == even { 8 } else { 7 }, vertical, &right));
            entries.push(whole(if vertical == even { 11 } else { 12 }, vertical, &left));
            entries.push(whole(9, even, &bulk));
            entries.push(whole(10, odd, &bulk));
            if template == RectangularTemplate::SpatialQubit {
                for (index, corner, even_cell) in [
                    (15, TopLeft, true),
                    (16, TopRight, false),
                    (17, BottomLeft, false),
                    (18, BottomRight, true),
                ] {
                    let basis = bases.on_parity(even_cell);
                    let cut = basis == horizontal
                        && basis == vertical
                        && !layout.junctions.contains(&corner);
                    let corners: Vec<Corner> = bulk
                        .iter()
                        .copied()
                        .filter(|candidate| !cut || *candidate != corner)
                        .collect();
                    entries.push(whole(index, basis, &corners));
                }
            }
        }
        RectangularTemplate::VerticalBorders | RectangularTemplate::HorizontalBorders => {
            // Cells on the first line own the data of their second side and
            // conversely; the outer data qubits belong to the cubes.
            let (first_side, second_side, first_line, walls, junction_cells) =
                if template == RectangularTemplate::VerticalBorders {
                    let horizontal = bases.horizontal_walls;
                    entries.push(Entry {
                        index: if horizontal == even { 2 } else { 1 },
                        basis: horizontal,
                        corners: bottom.clone(),
                        owned: Vec::new(),
                    });
                    entries.push(Entry {
                        index: if horizontal == even { 3 } else { 4 },
                        basis: horizontal,
                        corners: top.clone(),
                        owned: Vec::new(),
                    });
                    (
                        right.clone(),
                        left.clone(),
                        [1, 5, 6, 3],
                        horizontal,
                        [
                            (1, TopLeft, TopRight, false),
                            (2, TopRight, TopLeft, true),
                            (3, BottomLeft, BottomRight, true),
                            (4, BottomRight, BottomLeft, false),
                        ],
                    )
                } else {
                    let vertical = bases.vertical_walls;
                    entries.push(Entry {
                        index: if vertical == even { 3 } else { 1 },
                        basis: vertical,
                        corners: right.clone(),
                        owned: Vec::new(),
                    });
                    entries.push(Entry {
                        index: if vertical == even { 2 } else { 4 },
                        basis: vertical,
                        corners: left.clone(),
                        owned: Vec::new(),
                    });
                    (
                        bottom.clone(),
                        top.clone(),
                        [1, 5, 6, 2],
                        vertical,
                        [
                            (1, TopLeft, BottomLeft, false),
                            (2, TopRight, BottomRight, true),
                            (3, BottomLeft, TopLeft, true),
                            (4, BottomRight, TopRight, false),
                        ],
                    )
                };
            entries.push(whole(5, even, &bulk));
            entries.push(whole(6, odd, &bulk));
            entries.push(whole(7, odd, &bulk));
            entries.push(whole(8, even, &bulk));
            for entry in entries.iter_mut() {
                let side = if first_line.contains(&entry.index) {
                    &first_side
                } else {
                    &second_side
                };
                entry.owned = entry
                    .corners
                    .iter()
                    .copied()
                    .filter(|corner| side.contains(corner))
                    .collect();
            }
            for (index, corner, dropped, even_cell) in junction_cells {
                if !layout.junctions.contains(&corner) {
                    continue;
                }
                entries.retain(|entry| entry.index != index);
                let basis = bases.on_parity(even_cell);
                if basis != walls {
                    continue;
                }
                let corners: Vec<Corner> =
                    bulk.iter().copied().filter(|c| *c != dropped).collect();
                let owned = corners
                    .iter()
                    .copied()
                    .filter(|c| *c != dropped.opposite())
                    .collect();
                entries.push(Entry {
                    index,
                    basis,
                    corners,
                    owned,
                });
            }
        }
    }

    let mut collection = BTreeMap::new();
    for entry in entries {
        collection.insert(
            entry.index,
            css_plaquette_on(entry.basis, &entry.corners, &entry.owned, round)?,
        );
    }
    Ok(Plaquettes::new(collection))
}
