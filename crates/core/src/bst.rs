//! Binary search tree backend, plain or red-black balanced.
//!
//! Nodes live in an index arena (`Vec<Node>` plus a free list) with parent
//! links, `NIL` being the null index. The plain flavor performs no
//! rebalancing and degenerates to a list under sorted insertion; the
//! red-black flavor maintains the classic invariants (red root is
//! forbidden, no red node has a red child, every root-to-leaf path carries
//! the same number of black nodes), bounding the height to
//! 2*log2(len + 1).
//!
//! In-order traversal (leftmost node, then parent-link successor) yields
//! entries in ascending key order under the active comparator.

use std::cmp::Ordering;

use crate::value;
use crate::value::{Handlers, OpaqueCmp, Value};

pub(crate) const NIL: usize = usize::MAX;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Color {
    Red,
    Black,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Balancing {
    Plain,
    RedBlack,
}

struct Node {
    k: Value,
    v: Value,
    left: usize,
    right: usize,
    parent: usize,
    color: Color,
}

pub(crate) struct SearchTree {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: usize,
    size: usize,
    balancing: Balancing,
}

impl SearchTree {
    pub(crate) fn new(balancing: Balancing) -> Self {
        SearchTree {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NIL,
            size: 0,
            balancing,
        }
    }

    pub(crate) fn balancing(&self) -> Balancing {
        self.balancing
    }

    pub(crate) fn len(&self) -> usize {
        self.size
    }

    pub(crate) fn key(&self, i: usize) -> &Value {
        &self.nodes[i].k
    }

    pub(crate) fn value(&self, i: usize) -> &Value {
        &self.nodes[i].v
    }

    fn alloc(&mut self, k: Value, v: Value, parent: usize, color: Color) -> usize {
        let node = Node {
            k,
            v,
            left: NIL,
            right: NIL,
            parent,
            color,
        };
        match self.free.pop() {
            Some(i) => {
                self.nodes[i] = node;
                i
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn dealloc(&mut self, i: usize) {
        self.nodes[i] = Node {
            k: Value::Null,
            v: Value::Null,
            left: NIL,
            right: NIL,
            parent: NIL,
            color: Color::Black,
        };
        self.free.push(i);
    }

    fn color(&self, i: usize) -> Color {
        if i == NIL {
            Color::Black
        } else {
            self.nodes[i].color
        }
    }

    fn set_color(&mut self, i: usize, c: Color) {
        if i != NIL {
            self.nodes[i].color = c;
        }
    }

    /// Index of the node holding `k`, or `NIL`.
    pub(crate) fn find(&self, k: &Value, cmp: Option<OpaqueCmp>) -> usize {
        let mut cur = self.root;
        while cur != NIL {
            match value::compare(k, &self.nodes[cur].k, cmp) {
                Ordering::Less => cur = self.nodes[cur].left,
                Ordering::Greater => cur = self.nodes[cur].right,
                Ordering::Equal => return cur,
            }
        }
        NIL
    }

    /// Inserts or overwrites in place. Displaced payloads of an existing
    /// entry are released through `handlers` when `owns` is set.
    pub(crate) fn put(
        &mut self,
        k: Value,
        v: Value,
        cmp: Option<OpaqueCmp>,
        handlers: &Handlers,
        owns: bool,
    ) {
        let mut parent = NIL;
        let mut cur = self.root;
        let mut went_left = false;
        while cur != NIL {
            parent = cur;
            match value::compare(&k, &self.nodes[cur].k, cmp) {
                Ordering::Less => {
                    cur = self.nodes[cur].left;
                    went_left = true;
                }
                Ordering::Greater => {
                    cur = self.nodes[cur].right;
                    went_left = false;
                }
                Ordering::Equal => {
                    let node = &mut self.nodes[cur];
                    if owns {
                        node.k.release(handlers);
                        node.v.release(handlers);
                    }
                    node.k = k;
                    node.v = v;
                    return;
                }
            }
        }
        let color = match self.balancing {
            Balancing::Plain => Color::Black,
            Balancing::RedBlack => Color::Red,
        };
        let fresh = self.alloc(k, v, parent, color);
        if parent == NIL {
            self.root = fresh;
        } else if went_left {
            self.nodes[parent].left = fresh;
        } else {
            self.nodes[parent].right = fresh;
        }
        self.size += 1;
        if self.balancing == Balancing::RedBlack {
            self.insert_fixup(fresh);
        }
    }

    /// Unlinks the entry for `k` and returns its value. The displaced key
    /// is released when `owns` is set.
    pub(crate) fn pop(
        &mut self,
        k: &Value,
        cmp: Option<OpaqueCmp>,
        handlers: &Handlers,
        owns: bool,
    ) -> Option<Value> {
        let z = self.find(k, cmp);
        if z == NIL {
            return None;
        }
        let mut removed_color = self.color(z);
        let x;
        let x_parent;
        if self.nodes[z].left == NIL {
            x = self.nodes[z].right;
            x_parent = self.nodes[z].parent;
            self.transplant(z, x);
        } else if self.nodes[z].right == NIL {
            x = self.nodes[z].left;
            x_parent = self.nodes[z].parent;
            self.transplant(z, x);
        } else {
            let y = self.minimum(self.nodes[z].right);
            removed_color = self.color(y);
            x = self.nodes[y].right;
            if self.nodes[y].parent == z {
                x_parent = y;
            } else {
                x_parent = self.nodes[y].parent;
                self.transplant(y, x);
                let zr = self.nodes[z].right;
                self.nodes[y].right = zr;
                self.nodes[zr].parent = y;
            }
            self.transplant(z, y);
            let zl = self.nodes[z].left;
            self.nodes[y].left = zl;
            self.nodes[zl].parent = y;
            let zc = self.color(z);
            self.set_color(y, zc);
        }
        if self.balancing == Balancing::RedBlack && removed_color == Color::Black {
            self.delete_fixup(x, x_parent);
        }
        let key = std::mem::replace(&mut self.nodes[z].k, Value::Null);
        let val = std::mem::replace(&mut self.nodes[z].v, Value::Null);
        self.dealloc(z);
        self.size -= 1;
        if owns {
            key.release(handlers);
        }
        Some(val)
    }

    /// Drops every entry, releasing payloads when `owns` is set.
    pub(crate) fn clear(&mut self, handlers: &Handlers, owns: bool) {
        if owns {
            let mut i = self.first();
            while i != NIL {
                self.nodes[i].k.release(handlers);
                self.nodes[i].v.release(handlers);
                i = self.successor(i);
            }
        }
        self.nodes.clear();
        self.free.clear();
        self.root = NIL;
        self.size = 0;
    }

    /// Leftmost node, `NIL` when empty.
    pub(crate) fn first(&self) -> usize {
        if self.root == NIL {
            NIL
        } else {
            self.minimum(self.root)
        }
    }

    /// In-order successor via parent links.
    pub(crate) fn successor(&self, i: usize) -> usize {
        if self.nodes[i].right != NIL {
            return self.minimum(self.nodes[i].right);
        }
        let mut cur = i;
        let mut parent = self.nodes[cur].parent;
        while parent != NIL && self.nodes[parent].right == cur {
            cur = parent;
            parent = self.nodes[cur].parent;
        }
        parent
    }

    /// Longest root-to-leaf path in nodes; 0 for an empty tree.
    pub(crate) fn height(&self) -> usize {
        if self.root == NIL {
            return 0;
        }
        let mut max = 0;
        let mut stack = vec![(self.root, 1usize)];
        while let Some((i, depth)) = stack.pop() {
            max = max.max(depth);
            let node = &self.nodes[i];
            if node.left != NIL {
                stack.push((node.left, depth + 1));
            }
            if node.right != NIL {
                stack.push((node.right, depth + 1));
            }
        }
        max
    }

    fn minimum(&self, mut i: usize) -> usize {
        while self.nodes[i].left != NIL {
            i = self.nodes[i].left;
        }
        i
    }

    /// Replaces the subtree rooted at `u` with the one rooted at `v`.
    fn transplant(&mut self, u: usize, v: usize) {
        let p = self.nodes[u].parent;
        if p == NIL {
            self.root = v;
        } else if self.nodes[p].left == u {
            self.nodes[p].left = v;
        } else {
            self.nodes[p].right = v;
        }
        if v != NIL {
            self.nodes[v].parent = p;
        }
    }

    fn rotate_left(&mut self, x: usize) {
        let y = self.nodes[x].right;
        let yl = self.nodes[y].left;
        self.nodes[x].right = yl;
        if yl != NIL {
            self.nodes[yl].parent = x;
        }
        let xp = self.nodes[x].parent;
        self.nodes[y].parent = xp;
        if xp == NIL {
            self.root = y;
        } else if self.nodes[xp].left == x {
            self.nodes[xp].left = y;
        } else {
            self.nodes[xp].right = y;
        }
        self.nodes[y].left = x;
        self.nodes[x].parent = y;
    }

    fn rotate_right(&mut self, x: usize) {
        let y = self.nodes[x].left;
        let yr = self.nodes[y].right;
        self.nodes[x].left = yr;
        if yr != NIL {
            self.nodes[yr].parent = x;
        }
        let xp = self.nodes[x].parent;
        self.nodes[y].parent = xp;
        if xp == NIL {
            self.root = y;
        } else if self.nodes[xp].right == x {
            self.nodes[xp].right = y;
        } else {
            self.nodes[xp].left = y;
        }
        self.nodes[y].right = x;
        self.nodes[x].parent = y;
    }

    fn insert_fixup(&mut self, mut z: usize) {
        while self.color(self.nodes[z].parent) == Color::Red {
            let parent = self.nodes[z].parent;
            let grandparent = self.nodes[parent].parent;
            if parent == self.nodes[grandparent].left {
                let uncle = self.nodes[grandparent].right;
                if self.color(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    z = grandparent;
                } else {
                    if z == self.nodes[parent].right {
                        z = parent;
                        self.rotate_left(z);
                    }
                    let parent = self.nodes[z].parent;
                    let grandparent = self.nodes[parent].parent;
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_right(grandparent);
                }
            } else {
                let uncle = self.nodes[grandparent].left;
                if self.color(uncle) == Color::Red {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    z = grandparent;
                } else {
                    if z == self.nodes[parent].left {
                        z = parent;
                        self.rotate_right(z);
                    }
                    let parent = self.nodes[z].parent;
                    let grandparent = self.nodes[parent].parent;
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_left(grandparent);
                }
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    // x may be NIL, so its parent is tracked explicitly.
    fn delete_fixup(&mut self, mut x: usize, mut x_parent: usize) {
        while x != self.root && self.color(x) == Color::Black {
            if x == self.nodes[x_parent].left {
                let mut w = self.nodes[x_parent].right;
                if self.color(w) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(x_parent, Color::Red);
                    self.rotate_left(x_parent);
                    w = self.nodes[x_parent].right;
                }
                if self.color(self.nodes[w].left) == Color::Black
                    && self.color(self.nodes[w].right) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = x_parent;
                    x_parent = self.nodes[x].parent;
                } else {
                    if self.color(self.nodes[w].right) == Color::Black {
                        let wl = self.nodes[w].left;
                        self.set_color(wl, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.nodes[x_parent].right;
                    }
                    let pc = self.color(x_parent);
                    self.set_color(w, pc);
                    self.set_color(x_parent, Color::Black);
                    let wr = self.nodes[w].right;
                    self.set_color(wr, Color::Black);
                    self.rotate_left(x_parent);
                    x = self.root;
                    x_parent = NIL;
                }
            } else {
                let mut w = self.nodes[x_parent].left;
                if self.color(w) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(x_parent, Color::Red);
                    self.rotate_right(x_parent);
                    w = self.nodes[x_parent].left;
                }
                if self.color(self.nodes[w].left) == Color::Black
                    && self.color(self.nodes[w].right) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = x_parent;
                    x_parent = self.nodes[x].parent;
                } else {
                    if self.color(self.nodes[w].left) == Color::Black {
                        let wr = self.nodes[w].right;
                        self.set_color(wr, Color::Black);
                        self.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.nodes[x_parent].left;
                    }
                    let pc = self.color(x_parent);
                    self.set_color(w, pc);
                    self.set_color(x_parent, Color::Black);
                    let wl = self.nodes[w].left;
                    self.set_color(wl, Color::Black);
                    self.rotate_right(x_parent);
                    x = self.root;
                    x_parent = NIL;
                }
            }
        }
        self.set_color(x, Color::Black);
    }
}
