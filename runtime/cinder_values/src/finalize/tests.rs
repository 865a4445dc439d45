use super::*;
use pretty_assertions::assert_eq;

fn handle(i: u32) -> ObjRef {
    ObjRef::new(i, 0)
}

#[test]
fn sweep_keeps_survivors_in_order() {
    let mut list = FinalizerList::default();
    for i in 0..6 {
        list.add(handle(i));
    }
    let mut released = Vec::new();
    let dropped = list.sweep(|r| {
        let live = r.index() % 2 == 0;
        if !live {
            released.push(r.index());
        }
        live
    });
    assert_eq!(dropped, 3);
    assert_eq!(released, vec![1, 3, 5]);
    let left: Vec<usize> = list.drain().map(ObjRef::index).collect();
    assert_eq!(left, vec![0, 2, 4]);
}

#[test]
fn sweep_visits_each_entry_once() {
    let mut list = FinalizerList::default();
    for i in 0..4 {
        list.add(handle(i));
    }
    let mut visits = 0;
    list.sweep(|_| {
        visits += 1;
        true
    });
    assert_eq!(visits, 4);
    assert_eq!(list.len(), 4);
    assert!(list.contains(handle(3)));
}

#[test]
fn sweep_of_all_dead_empties_list() {
    let mut list = FinalizerList::default();
    list.add(handle(7));
    list.add(handle(8));
    assert_eq!(list.sweep(|_| false), 2);
    assert_eq!(list.len(), 0);
}
