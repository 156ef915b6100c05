use serde::{Deserialize, Serialize};

use crate::game::{Board, Position};

/// Root of the move tree for one piece: its origin square plus every legal
/// continuation. Branches of a capture chain are themselves `Jump` nodes all
/// the way down; the generator never mixes slides into a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveTree {
    pub from: Position,
    pub branches: Vec<MoveNode>,
}

impl MoveTree {
    pub fn new(from: Position, branches: Vec<MoveNode>) -> Self {
        MoveTree { from, branches }
    }
}

/// One node of the move tree below the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveNode {
    /// Plain move to an empty square.
    Slide { to: Position },
    /// Capture: remove the piece at `over`, land at `to`, then possibly
    /// continue with further jumps from the landing square.
    Jump {
        over: Position,
        to: Position,
        continuations: Vec<MoveNode>,
    },
}

impl MoveNode {
    /// The square the moving piece occupies after this node.
    pub fn end_pos(&self) -> Position {
        match self {
            MoveNode::Slide { to } => *to,
            MoveNode::Jump { to, .. } => *to,
        }
    }

    /// Moves that can follow this one within the same turn.
    pub fn continuations(&self) -> &[MoveNode] {
        match self {
            MoveNode::Slide { .. } => &[],
            MoveNode::Jump { continuations, .. } => continuations,
        }
    }

    /// This node without its continuations.
    pub fn step(&self) -> Step {
        match self {
            MoveNode::Slide { to } => Step::Slide { to: *to },
            MoveNode::Jump { over, to, .. } => Step::Jump {
                over: *over,
                to: *to,
            },
        }
    }
}

/// One element of a chosen sequence; the flat counterpart of `MoveNode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Slide { to: Position },
    Jump { over: Position, to: Position },
}

impl Step {
    pub fn end_pos(&self) -> Position {
        match self {
            Step::Slide { to } => *to,
            Step::Jump { to, .. } => *to,
        }
    }
}

/// A full turn: one root-to-leaf path through a move tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSequence {
    pub from: Position,
    pub steps: Vec<Step>,
}

impl MoveSequence {
    /// Stand-in for the turn of a side with no legal moves. Executes as a
    /// no-op; the turn controller never accepts one from a caller.
    pub fn pass() -> Self {
        MoveSequence {
            from: Position::new(0, 0),
            steps: Vec::new(),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.steps.is_empty()
    }

    /// The square the moving piece occupies once the whole turn is played.
    pub fn landing(&self) -> Position {
        self.steps.last().map_or(self.from, |step| step.end_pos())
    }

    /// Number of enemy pieces this turn removes.
    pub fn captures(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step, Step::Jump { .. }))
            .count()
    }

    /// Apply the turn to a board: each slide moves the occupant onward, each
    /// jump also removes the captured piece. Produces exactly the post-turn
    /// position the rendering layer will eventually show.
    pub fn execute(&self, board: &mut Board) {
        let mut current = self.from;
        for step in &self.steps {
            match step {
                Step::Slide { to } => {
                    board.swap(current, *to);
                    current = *to;
                }
                Step::Jump { over, to } => {
                    board.swap(current, *to);
                    board.kill(*over);
                    current = *to;
                }
            }
        }
    }
}

/// Every playable turn reachable from a set of move trees, depth-first in
/// tree order. A sequence ends only at a leaf: a capture chain cannot be cut
/// short. Yields a single pass sequence when there are no trees.
pub fn all_turn_sequences(trees: &[MoveTree]) -> Vec<MoveSequence> {
    if trees.is_empty() {
        return vec![MoveSequence::pass()];
    }
    let mut sequences = Vec::new();
    for tree in trees {
        let mut path = Vec::new();
        for branch in &tree.branches {
            collect_sequences(tree.from, branch, &mut path, &mut sequences);
        }
    }
    sequences
}

fn collect_sequences(
    from: Position,
    node: &MoveNode,
    path: &mut Vec<Step>,
    out: &mut Vec<MoveSequence>,
) {
    path.push(node.step());
    let continuations = node.continuations();
    if continuations.is_empty() {
        out.push(MoveSequence {
            from,
            steps: path.clone(),
        });
    } else {
        for child in continuations {
            collect_sequences(from, child, path, out);
        }
    }
    path.pop();
}

/// Whether `sequence` is a complete root-to-leaf path of one of the trees.
pub fn tree_contains(trees: &[MoveTree], sequence: &MoveSequence) -> bool {
    if sequence.is_pass() {
        return false;
    }
    let Some(tree) = trees.iter().find(|t| t.from == sequence.from) else {
        return false;
    };
    let mut nodes = tree.branches.as_slice();
    let mut matched: Option<&MoveNode> = None;
    for step in &sequence.steps {
        let Some(node) = nodes.iter().find(|n| n.step() == *step) else {
            return false;
        };
        nodes = node.continuations();
        matched = Some(node);
    }
    // the final node must be a leaf
    matched.is_some_and(|node| node.continuations().is_empty())
}
