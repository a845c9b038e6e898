use std::fmt;

use concord_splay::{SplayTree, SplayValue};

struct Chunk(&'static str);

impl SplayValue for Chunk {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[test]
fn insert_and_splay() {
    let mut tree = SplayTree::new();

    let node_a = tree.insert(Chunk("A2"));
    assert_eq!(tree.annotated_string(), "[2,2]A2");
    let node_b = tree.insert(Chunk("B23"));
    assert_eq!(tree.annotated_string(), "[2,2]A2[5,3]B23");
    let node_c = tree.insert(Chunk("C234"));
    assert_eq!(tree.annotated_string(), "[2,2]A2[5,3]B23[9,4]C234");
    let node_d = tree.insert(Chunk("D2345"));
    assert_eq!(tree.annotated_string(), "[2,2]A2[5,3]B23[9,4]C234[14,5]D2345");

    tree.splay(node_b);
    assert_eq!(tree.annotated_string(), "[2,2]A2[14,3]B23[9,4]C234[5,5]D2345");

    assert_eq!(tree.index_of(node_a), 0);
    assert_eq!(tree.index_of(node_b), 2);
    assert_eq!(tree.index_of(node_c), 5);
    assert_eq!(tree.index_of(node_d), 9);
}

#[test]
fn find_returns_node_and_remaining_offset() {
    let mut tree = SplayTree::new();
    let node_a = tree.insert(Chunk("ab"));
    let node_b = tree.insert(Chunk("cde"));
    let node_c = tree.insert(Chunk("f"));

    let (node, offset) = tree.find(0).unwrap();
    assert_eq!((node, offset), (node_a, 0));

    let (node, offset) = tree.find(1).unwrap();
    assert_eq!((node, offset), (node_a, 1));

    // A boundary offset resolves to the end of the left-hand node.
    let (node, offset) = tree.find(2).unwrap();
    assert_eq!((node, offset), (node_a, 2));

    let (node, offset) = tree.find(4).unwrap();
    assert_eq!((node, offset), (node_b, 2));

    let (node, offset) = tree.find(6).unwrap();
    assert_eq!((node, offset), (node_c, 1));

    assert!(tree.check_weights().is_ok());
}

#[test]
fn find_on_empty_tree() {
    let mut tree: SplayTree<Chunk> = SplayTree::new();
    assert!(tree.find(0).is_none());
}

#[test]
fn index_of_equals_sum_of_lengths_to_the_left() {
    let chunks = ["lorem", "ipsum", "dolor", "sit", "amet", "consectetur"];
    let mut tree = SplayTree::new();
    let handles: Vec<_> = chunks.iter().map(|c| tree.insert(Chunk(c))).collect();

    // Access in a scrambled order so the tree reshapes between queries.
    for &i in &[3usize, 0, 5, 1, 4, 2] {
        let expected: usize = chunks[..i].iter().map(|c| c.len()).sum();
        assert_eq!(tree.index_of(handles[i]), expected, "chunk {i}");
        assert!(tree.check_weights().is_ok());
    }

    let total: usize = chunks.iter().map(|c| c.len()).sum();
    assert_eq!(tree.len(), total);
}

#[test]
fn delete_detaches_and_repairs_weights() {
    let mut tree = SplayTree::new();
    let _a = tree.insert(Chunk("aa"));
    let b = tree.insert(Chunk("bbb"));
    let c = tree.insert(Chunk("cccc"));

    tree.delete(b);
    assert_eq!(tree.len(), 6);
    assert!(tree.check_weights().is_ok());

    let (node, offset) = tree.find(3).unwrap();
    assert_eq!((node, offset), (c, 1));

    tree.delete(c);
    assert_eq!(tree.len(), 2);

    let d = tree.insert(Chunk("dd"));
    assert_eq!(tree.index_of(d), 2);
    assert_eq!(tree.len(), 4);
}

#[test]
fn delete_only_node_empties_the_tree() {
    let mut tree = SplayTree::new();
    let a = tree.insert(Chunk("solo"));
    tree.delete(a);
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.annotated_string(), "");
}
