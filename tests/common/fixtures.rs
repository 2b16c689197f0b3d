//! Tracker data shared by scenario and CLI tests.
//!
//! Users: 1 admin (member of project 5 through a role without
//! `view_issues`), 2 jsmith, 3 dlopper, 6 reporter on project 3 only,
//! 8 member of project 5 with notifications disabled.
//! Projects 1..=6. Issue 1 lives in project 1, issue 4 in project 2.

use multiprojects_lib::jsonl::Snapshot;
use multiprojects_lib::model::{Issue, IssueId, Member, Project, ProjectId, Role, User, UserId};

fn role(name: &str, permissions: &[&str]) -> Role {
    Role {
        name: name.to_string(),
        permissions: permissions.iter().map(ToString::to_string).collect(),
    }
}

fn user(id: u32, login: &str, notifications_enabled: bool, admin: bool) -> User {
    User {
        id: UserId(id),
        login: login.to_string(),
        mail: format!("{login}@somenet.foo"),
        notifications_enabled,
        admin,
    }
}

fn member(user: u32, project: u32, role: &str) -> Member {
    Member {
        user: UserId(user),
        project: ProjectId(project),
        roles: vec![role.to_string()],
    }
}

#[must_use]
pub fn tracker() -> Snapshot {
    let projects = [
        (1, "eCookbook", "ecookbook"),
        (2, "OnlineStore", "onlinestore"),
        (3, "eCookbook Subproject 1", "subproject1"),
        (4, "eCookbook Subproject 2", "subproject2"),
        (5, "Private child of eCookbook", "private-child"),
        (6, "Child of private child", "project6"),
    ]
    .into_iter()
    .map(|(id, name, identifier)| Project {
        id: ProjectId(id),
        name: name.to_string(),
        identifier: Some(identifier.to_string()),
        active: true,
    })
    .collect();

    let roles = vec![
        role(
            "Manager",
            &["view_issues", "add_issues", "edit_issues", "add_issue_notes"],
        ),
        role(
            "Developer",
            &["view_issues", "add_issues", "edit_issues", "add_issue_notes"],
        ),
        role("Reporter", &["view_issues", "add_issues", "add_issue_notes"]),
        role("Observer", &["view_wiki_pages"]),
    ];

    let users = vec![
        user(1, "admin", true, true),
        user(2, "jsmith", true, false),
        user(3, "dlopper", true, false),
        user(6, "reporter", true, false),
        user(8, "miscuser8", false, false),
    ];

    let members = vec![
        member(2, 1, "Manager"),
        member(3, 1, "Developer"),
        member(2, 2, "Developer"),
        member(2, 5, "Manager"),
        member(1, 5, "Observer"),
        member(8, 5, "Developer"),
        member(6, 3, "Reporter"),
    ];

    let issues = vec![
        Issue::new(IssueId(1), "Cannot print recipes", ProjectId(1), UserId(2)),
        Issue::new(IssueId(4), "Issue on project 2", ProjectId(2), UserId(2)),
    ];

    Snapshot {
        projects,
        users,
        roles,
        members,
        issues,
    }
}
