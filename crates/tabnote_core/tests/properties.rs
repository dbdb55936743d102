use proptest::prelude::*;
use tabnote_core::{
    transition, Command, Group, GroupFilterToggle, GroupPatch, MemoryPersistence, SequenceEnv,
    SettingsPatch, Snapshot, Store, Tab, TabPatch, HISTORY_LIMIT,
};

const GHOST: &str = "ghost";

/// One UI action. Targets are indexes resolved against the snapshot the
/// action is applied to, so shrunk sequences stay meaningful.
#[derive(Clone, Debug)]
enum Op {
    CreateTab { group: Option<usize> },
    DeleteTab(usize),
    EditContent { tab: usize, text: String },
    CreateGroup { member: Option<usize> },
    MoveTab { tab: usize, group: Option<usize> },
    ReplaceMembers { group: usize, tab: usize },
    DeleteGroup(usize),
    Select(usize),
    SelectGhost,
    ToggleFilter(usize),
    ResetFilters,
    ChangeTheme(String),
    ClearHistory,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        proptest::option::of(0_usize..8).prop_map(|group| Op::CreateTab { group }),
        (0_usize..8).prop_map(Op::DeleteTab),
        (0_usize..8, "[a-z ]{0,12}").prop_map(|(tab, text)| Op::EditContent { tab, text }),
        proptest::option::of(0_usize..8).prop_map(|member| Op::CreateGroup { member }),
        (0_usize..8, proptest::option::of(0_usize..8))
            .prop_map(|(tab, group)| Op::MoveTab { tab, group }),
        (0_usize..8, 0_usize..8).prop_map(|(group, tab)| Op::ReplaceMembers { group, tab }),
        (0_usize..8).prop_map(Op::DeleteGroup),
        (0_usize..8).prop_map(Op::Select),
        Just(Op::SelectGhost),
        (0_usize..8).prop_map(Op::ToggleFilter),
        Just(Op::ResetFilters),
        "[a-z]{1,8}".prop_map(Op::ChangeTheme),
        Just(Op::ClearHistory),
    ]
}

fn pick(ids: Vec<String>, index: usize) -> Option<String> {
    if ids.is_empty() {
        None
    } else {
        Some(ids[index % ids.len()].clone())
    }
}

fn tab_at(snapshot: &Snapshot, index: usize) -> String {
    pick(snapshot.tabs.iter().map(|tab| tab.id.clone()).collect(), index)
        .unwrap_or_else(|| "none".to_string())
}

fn group_at(snapshot: &Snapshot, index: usize) -> Option<String> {
    pick(
        snapshot.groups.iter().map(|group| group.id.clone()).collect(),
        index,
    )
}

/// Turns `op` into a command; `step` keeps generated ids unique.
fn to_command(op: &Op, snapshot: &Snapshot, step: usize) -> Command {
    match op {
        Op::CreateTab { group } => {
            let mut tab = Tab::untitled(format!("t{step}"), step as i64);
            tab.group_id = group.and_then(|index| group_at(snapshot, index));
            Command::CreateTab(tab)
        }
        Op::DeleteTab(tab) => Command::DeleteTab(tab_at(snapshot, *tab)),
        Op::EditContent { tab, text } => Command::UpdateTab {
            id: tab_at(snapshot, *tab),
            patch: TabPatch::content(text.clone()),
        },
        Op::CreateGroup { member } => {
            let mut group = Group::new(format!("g{step}"), format!("Group {step}"));
            if let Some(index) = member {
                group.tab_ids = vec![tab_at(snapshot, *index)];
            }
            Command::CreateGroup(group)
        }
        Op::MoveTab { tab, group } => Command::UpdateTab {
            id: tab_at(snapshot, *tab),
            patch: TabPatch::group(group.and_then(|index| group_at(snapshot, index))),
        },
        Op::ReplaceMembers { group, tab } => match group_at(snapshot, *group) {
            Some(id) => Command::UpdateGroup {
                id,
                patch: GroupPatch {
                    tab_ids: Some(vec![tab_at(snapshot, *tab), GHOST.to_string()]),
                    ..GroupPatch::default()
                },
            },
            None => Command::Unknown,
        },
        Op::DeleteGroup(group) => match group_at(snapshot, *group) {
            Some(id) => Command::DeleteGroup(id),
            None => Command::Unknown,
        },
        Op::Select(tab) => Command::SetActiveTab(Some(tab_at(snapshot, *tab))),
        Op::SelectGhost => Command::SetActiveTab(Some(GHOST.to_string())),
        Op::ToggleFilter(group) => match group_at(snapshot, *group) {
            Some(id) => Command::ToggleGroupFilter(GroupFilterToggle::Group(id)),
            None => Command::ToggleGroupFilter(GroupFilterToggle::ResetAll),
        },
        Op::ResetFilters => Command::ToggleGroupFilter(GroupFilterToggle::ResetAll),
        Op::ChangeTheme(theme) => Command::UpdateSettings(SettingsPatch {
            theme: Some(theme.clone()),
            ..SettingsPatch::default()
        }),
        Op::ClearHistory => Command::ClearHistory,
    }
}

fn seeded(tab_count: usize) -> Snapshot {
    Snapshot {
        tabs: (0..tab_count)
            .map(|index| Tab::untitled(format!("seed{index}"), 0))
            .collect(),
        active_tab_id: Some("seed0".to_string()),
        ..Snapshot::default()
    }
}

proptest! {
    #[test]
    fn tab_set_never_empties_under_deletes(
        tab_count in 1_usize..6,
        targets in prop::collection::vec(0_usize..8, 1..40)
    ) {
        let mut env = SequenceEnv::new();
        let mut snapshot = seeded(tab_count);
        for target in targets {
            let id = tab_at(&snapshot, target);
            snapshot = transition(&snapshot, Command::DeleteTab(id), &mut env);
            prop_assert!(!snapshot.tabs.is_empty());
            prop_assert_eq!(snapshot.check_invariants(), Ok(()));
        }
    }

    #[test]
    fn membership_stays_consistent_across_commands(
        ops in prop::collection::vec(op_strategy(), 0..80)
    ) {
        let mut env = SequenceEnv::new();
        let mut snapshot = seeded(1);
        for (step, op) in ops.iter().enumerate() {
            let command = to_command(op, &snapshot, step);
            snapshot = transition(&snapshot, command, &mut env);
            prop_assert_eq!(snapshot.check_invariants_except_selection(), Ok(()));
            if let Some(active) = snapshot.dangling_selection() {
                prop_assert_eq!(active, GHOST);
            }
        }
    }

    #[test]
    fn store_write_through_matches_snapshot_after_failures(
        ops in prop::collection::vec((op_strategy(), any::<bool>()), 0..40)
    ) {
        let mut store =
            Store::open_with_env(MemoryPersistence::new(), SequenceEnv::new()).unwrap();
        for (step, (op, fail)) in ops.iter().enumerate() {
            store.persistence_mut().fail_writes(*fail);
            let command = to_command(op, store.snapshot(), step);
            let result = store.dispatch(command);
            if !*fail {
                prop_assert!(result.is_ok());
            }
        }
        store.persistence_mut().fail_writes(false);
        store.flush().unwrap();
        prop_assert!(!store.has_pending_writes());

        let expected: Vec<(String, String)> = store
            .snapshot()
            .tabs
            .iter()
            .map(|tab| (tab.id.clone(), tab.content.clone()))
            .collect();
        let reopened =
            Store::open_with_env(store.persistence().clone(), SequenceEnv::new()).unwrap();
        let reloaded: Vec<(String, String)> = reopened
            .snapshot()
            .tabs
            .iter()
            .map(|tab| (tab.id.clone(), tab.content.clone()))
            .collect();
        prop_assert_eq!(reloaded, expected);
    }

    #[test]
    fn deleting_sole_group_member_leaves_group_size_one(
        name in "[A-Za-z][A-Za-z ]{0,11}",
        color in "#[0-9a-f]{6}"
    ) {
        let mut env = SequenceEnv::new();
        let mut group = Group::new("G", name.clone());
        group.color = color.clone();
        group.tab_ids = vec!["only".to_string()];
        let mut member = Tab::untitled("only", 0);
        member.group_id = Some("G".to_string());
        let snapshot = Snapshot {
            tabs: vec![Tab::untitled("other", 0), member],
            groups: vec![group],
            active_tab_id: Some("other".to_string()),
            ..Snapshot::default()
        };

        let next = transition(&snapshot, Command::DeleteTab("only".to_string()), &mut env);
        let group = next.group("G").unwrap();
        prop_assert_eq!(group.tab_ids.len(), 1);
        let placeholder = next.tab(&group.tab_ids[0]).unwrap();
        prop_assert_ne!(placeholder.id.as_str(), "only");
        prop_assert_eq!(placeholder.group_id.as_deref(), Some("G"));
        prop_assert_eq!(&placeholder.name, &name);
        prop_assert_eq!(&placeholder.color, &color);
        prop_assert_eq!(next.active_tab_id.as_deref(), Some("other"));
    }

    #[test]
    fn reset_all_clears_every_filter(filter_count in 0_usize..6) {
        let mut env = SequenceEnv::new();
        let mut snapshot = seeded(1);
        for index in 0..filter_count {
            snapshot = transition(
                &snapshot,
                Command::CreateGroup(Group::new(format!("g{index}"), "G")),
                &mut env,
            );
            snapshot = transition(
                &snapshot,
                Command::ToggleGroupFilter(GroupFilterToggle::Group(format!("g{index}"))),
                &mut env,
            );
        }
        prop_assert_eq!(snapshot.active_group_filters.len(), filter_count);

        let next = transition(
            &snapshot,
            Command::ToggleGroupFilter(GroupFilterToggle::ResetAll),
            &mut env,
        );
        prop_assert!(next.active_group_filters.is_empty());
        prop_assert_eq!(&next.tabs, &snapshot.tabs);
        prop_assert_eq!(&next.active_tab_id, &snapshot.active_tab_id);
    }
}

#[test]
fn history_keeps_newest_hundred_entries() {
    let mut env = SequenceEnv::new();
    let mut snapshot = seeded(1);
    for index in 0..150 {
        snapshot = transition(
            &snapshot,
            Command::log("settings", format!("entry {index}")),
            &mut env,
        );
    }

    assert_eq!(snapshot.history.len(), HISTORY_LIMIT);
    let descriptions: Vec<&str> = snapshot
        .history
        .iter()
        .map(|entry| entry.description.as_str())
        .collect();
    assert_eq!(descriptions.first().copied(), Some("entry 149"));
    assert_eq!(descriptions.last().copied(), Some("entry 50"));
}
