/// Many-to-many link table exposed as `/api/<owner>/:id/<segment>`.
///
/// Links are hard-inserted and hard-deleted; the pair of foreign keys is
/// unique, so linking twice is a conflict.
#[derive(Debug)]
pub struct JunctionDef {
    pub owner: &'static str,
    pub segment: &'static str,
    pub table: &'static str,
    pub owner_column: &'static str,
    pub target_column: &'static str,
    /// Resource whose rows are listed for the owner
    pub target: &'static str,
}

pub static PROJECT_COUNTIES: JunctionDef = JunctionDef {
    owner: "projects",
    segment: "counties",
    table: "project_counties",
    owner_column: "projectId",
    target_column: "countyId",
    target: "counties",
};

pub static PROJECT_SUBCOUNTIES: JunctionDef = JunctionDef {
    owner: "projects",
    segment: "subcounties",
    table: "project_subcounties",
    owner_column: "projectId",
    target_column: "subcountyId",
    target: "subcounties",
};

pub static PROJECT_WARDS: JunctionDef = JunctionDef {
    owner: "projects",
    segment: "wards",
    table: "project_wards",
    owner_column: "projectId",
    target_column: "wardId",
    target: "wards",
};

pub static PROJECT_CONTRACTORS: JunctionDef = JunctionDef {
    owner: "projects",
    segment: "contractors",
    table: "project_contractor_assignments",
    owner_column: "projectId",
    target_column: "contractorId",
    target: "contractors",
};

pub static MILESTONE_ACTIVITIES: JunctionDef = JunctionDef {
    owner: "milestones",
    segment: "activities",
    table: "milestone_activities",
    owner_column: "milestoneId",
    target_column: "activityId",
    target: "activities",
};

/// The same table seen from the activity side
pub static ACTIVITY_MILESTONES: JunctionDef = JunctionDef {
    owner: "activities",
    segment: "milestones",
    table: "milestone_activities",
    owner_column: "activityId",
    target_column: "milestoneId",
    target: "milestones",
};

pub static JUNCTIONS: &[&JunctionDef] = &[
    &PROJECT_COUNTIES,
    &PROJECT_SUBCOUNTIES,
    &PROJECT_WARDS,
    &PROJECT_CONTRACTORS,
    &MILESTONE_ACTIVITIES,
    &ACTIVITY_MILESTONES,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{find, RESOURCES};

    #[test]
    fn junction_paths_do_not_shadow_child_listings() {
        for junction in JUNCTIONS {
            assert!(find(junction.owner).is_some());
            assert!(find(junction.target).is_some());
            for def in RESOURCES {
                let shadowed = def.name == junction.segment && def.parent_column(junction.owner).is_some();
                assert!(!shadowed, "{}/{} collides with a child listing", junction.owner, junction.segment);
            }
        }
    }
}
