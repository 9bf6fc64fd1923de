use crate::models::{ActivityRecord, Role, UserRecord};

const SALES_DEPARTMENT: &str = "Sales";

/// What a signed-in user is allowed to see.
pub trait VisibilityPolicy: Send + Sync {
    fn sees_activity(&self, activity: &ActivityRecord) -> bool;
    fn sees_user(&self, user: &UserRecord) -> bool;
}

pub struct FullAccess;

impl VisibilityPolicy for FullAccess {
    fn sees_activity(&self, _activity: &ActivityRecord) -> bool {
        true
    }

    fn sees_user(&self, user: &UserRecord) -> bool {
        user.role() == Role::TerritorySalesAssociate && user.department == SALES_DEPARTMENT
    }
}

pub struct AdminAccess;

impl VisibilityPolicy for AdminAccess {
    fn sees_activity(&self, _activity: &ActivityRecord) -> bool {
        false
    }

    fn sees_user(&self, user: &UserRecord) -> bool {
        user.department == SALES_DEPARTMENT && user.role() != Role::SuperAdmin
    }
}

pub struct ManagerTeam {
    reference_id: String,
}

impl VisibilityPolicy for ManagerTeam {
    fn sees_activity(&self, activity: &ActivityRecord) -> bool {
        activity.manager == self.reference_id
    }

    fn sees_user(&self, user: &UserRecord) -> bool {
        user.manager == self.reference_id
    }
}

pub struct TsmAssociates {
    reference_id: String,
}

impl VisibilityPolicy for TsmAssociates {
    fn sees_activity(&self, activity: &ActivityRecord) -> bool {
        activity.tsm == self.reference_id
    }

    fn sees_user(&self, user: &UserRecord) -> bool {
        user.department == SALES_DEPARTMENT && user.tsm == self.reference_id
    }
}

pub struct NoAccess;

impl VisibilityPolicy for NoAccess {
    fn sees_activity(&self, _activity: &ActivityRecord) -> bool {
        false
    }

    fn sees_user(&self, _user: &UserRecord) -> bool {
        false
    }
}

pub fn policy_for(viewer: &UserRecord) -> Box<dyn VisibilityPolicy> {
    let reference_id = viewer.reference_id.clone();
    match viewer.role() {
        Role::SuperAdmin | Role::SpecialAccess => Box::new(FullAccess),
        Role::Admin => Box::new(AdminAccess),
        Role::Manager => Box::new(ManagerTeam { reference_id }),
        Role::TerritorySalesManager => Box::new(TsmAssociates { reference_id }),
        Role::TerritorySalesAssociate | Role::Other(_) => Box::new(NoAccess),
    }
}

pub fn visible_activities<'a>(
    policy: &dyn VisibilityPolicy,
    activities: &'a [ActivityRecord],
) -> Vec<&'a ActivityRecord> {
    activities
        .iter()
        .filter(|activity| policy.sees_activity(activity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(reference_id: &str, role: &str) -> UserRecord {
        UserRecord {
            id: format!("id-{reference_id}"),
            reference_id: reference_id.to_string(),
            firstname: "Test".to_string(),
            lastname: "User".to_string(),
            email: String::new(),
            role: role.to_string(),
            department: SALES_DEPARTMENT.to_string(),
            company: String::new(),
            tsm: String::new(),
            manager: String::new(),
            target_quota: 0.0,
        }
    }

    fn activity(manager: &str, tsm: &str) -> ActivityRecord {
        ActivityRecord {
            id: 1,
            companyname: "Acme".to_string(),
            contactperson: String::new(),
            referenceid: "TSA-1".to_string(),
            manager: manager.to_string(),
            tsm: tsm.to_string(),
            typeclient: String::new(),
            typeactivity: String::new(),
            activitystatus: String::new(),
            source: String::new(),
            date_created: Utc::now(),
            soamount: 0.0,
            actualsales: 0.0,
            targetquota: 0.0,
            activitynumber: None,
            callstatus: None,
        }
    }

    #[test]
    fn super_admin_and_special_access_see_everything() {
        let row = activity("MGR-1", "TSM-1");
        assert!(policy_for(&user("SA", "Super Admin")).sees_activity(&row));
        assert!(policy_for(&user("SP", "Special Access")).sees_activity(&row));
    }

    #[test]
    fn manager_sees_own_team_only() {
        let policy = policy_for(&user("MGR-1", "Manager"));
        let rows = vec![activity("MGR-1", "TSM-1"), activity("MGR-2", "TSM-1")];
        assert_eq!(visible_activities(policy.as_ref(), &rows).len(), 1);
    }

    #[test]
    fn tsm_sees_own_associates() {
        let policy = policy_for(&user("TSM-1", "Territory Sales Manager"));
        assert!(policy.sees_activity(&activity("MGR-9", "TSM-1")));
        assert!(!policy.sees_activity(&activity("MGR-9", "TSM-2")));

        let mut associate = user("TSA-1", "Territory Sales Associate");
        associate.tsm = "TSM-1".to_string();
        assert!(policy.sees_user(&associate));
        associate.department = "Marketing".to_string();
        assert!(!policy.sees_user(&associate));
    }

    #[test]
    fn roster_rules_differ_for_admins() {
        let super_admin = policy_for(&user("SA", "Super Admin"));
        let admin = policy_for(&user("AD", "Admin"));
        let tsm = user("TSM-1", "Territory Sales Manager");
        let root = user("ROOT", "Super Admin");

        assert!(!super_admin.sees_user(&tsm));
        assert!(super_admin.sees_user(&user("TSA-1", "Territory Sales Associate")));
        assert!(admin.sees_user(&tsm));
        assert!(!admin.sees_user(&root));
    }

    #[test]
    fn associates_see_nothing() {
        let policy = policy_for(&user("TSA-1", "Territory Sales Associate"));
        assert!(!policy.sees_activity(&activity("MGR-1", "TSM-1")));
    }
}
