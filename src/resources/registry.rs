use super::ColumnType::{BigInt, Bool, Date, Numeric, Text, Timestamp};
use super::{col, req, Cascade, IdStrategy, ParentLink, ResourceDef};

// Administrative units

pub static COUNTIES: ResourceDef = ResourceDef {
    name: "counties",
    table: "counties",
    label: "County",
    id_strategy: IdStrategy::Serial,
    columns: &[req("name", Text), col("code", Text)],
    parents: &[],
    cascades: &[],
    default_order: "name asc",
};

pub static SUBCOUNTIES: ResourceDef = ResourceDef {
    name: "subcounties",
    table: "subcounties",
    label: "Subcounty",
    id_strategy: IdStrategy::Serial,
    columns: &[req("countyId", BigInt), req("name", Text), col("code", Text)],
    parents: &[ParentLink { parent: "counties", column: "countyId" }],
    cascades: &[],
    default_order: "name asc",
};

pub static WARDS: ResourceDef = ResourceDef {
    name: "wards",
    table: "wards",
    label: "Ward",
    id_strategy: IdStrategy::Serial,
    columns: &[req("subcountyId", BigInt), req("name", Text), col("code", Text)],
    parents: &[ParentLink { parent: "subcounties", column: "subcountyId" }],
    cascades: &[],
    default_order: "name asc",
};

pub static DEPARTMENTS: ResourceDef = ResourceDef {
    name: "departments",
    table: "departments",
    label: "Department",
    id_strategy: IdStrategy::Serial,
    columns: &[req("name", Text), col("alias", Text), col("location", Text)],
    parents: &[],
    cascades: &[],
    default_order: "name asc",
};

pub static SECTIONS: ResourceDef = ResourceDef {
    name: "sections",
    table: "sections",
    label: "Section",
    id_strategy: IdStrategy::Serial,
    columns: &[req("departmentId", BigInt), req("name", Text), col("alias", Text)],
    parents: &[ParentLink { parent: "departments", column: "departmentId" }],
    cascades: &[],
    default_order: "name asc",
};

// Strategic planning

pub static STRATEGIC_PLANS: ResourceDef = ResourceDef {
    name: "strategic-plans",
    table: "strategic_plans",
    label: "Strategic plan",
    id_strategy: IdStrategy::Serial,
    columns: &[
        req("cidpId", Text),
        req("cidpName", Text),
        col("startDate", Date),
        col("endDate", Date),
        col("description", Text),
    ],
    parents: &[],
    cascades: &[
        Cascade { table: "programs", condition: "\"strategicPlanId\" = {}" },
        Cascade {
            table: "subprograms",
            condition: "\"programId\" IN (SELECT \"id\" FROM \"programs\" WHERE \"strategicPlanId\" = {})",
        },
    ],
    default_order: "startDate desc",
};

pub static PROGRAMS: ResourceDef = ResourceDef {
    name: "programs",
    table: "programs",
    label: "Program",
    id_strategy: IdStrategy::Serial,
    columns: &[
        req("strategicPlanId", BigInt),
        col("departmentId", BigInt),
        req("programme", Text),
        col("needsPriorities", Text),
        col("strategies", Text),
        col("objectives", Text),
        col("outcomes", Text),
        col("remarks", Text),
    ],
    parents: &[
        ParentLink { parent: "strategic-plans", column: "strategicPlanId" },
        ParentLink { parent: "departments", column: "departmentId" },
    ],
    cascades: &[Cascade { table: "subprograms", condition: "\"programId\" = {}" }],
    default_order: "programme asc",
};

pub static SUBPROGRAMS: ResourceDef = ResourceDef {
    name: "subprograms",
    table: "subprograms",
    label: "Subprogram",
    id_strategy: IdStrategy::Serial,
    columns: &[
        req("programId", BigInt),
        req("subProgramme", Text),
        col("keyOutcome", Text),
        col("kpi", Text),
        col("baseline", Text),
        col("yr1Targets", Text),
        col("yr2Targets", Text),
        col("yr3Targets", Text),
        col("yr4Targets", Text),
        col("yr5Targets", Text),
        col("yr1Budget", Numeric),
        col("yr2Budget", Numeric),
        col("yr3Budget", Numeric),
        col("yr4Budget", Numeric),
        col("yr5Budget", Numeric),
        col("totalBudget", Numeric),
        col("remarks", Text),
    ],
    parents: &[ParentLink { parent: "programs", column: "programId" }],
    cascades: &[],
    default_order: "subProgramme asc",
};

// Projects and their children

pub static PROJECT_CATEGORIES: ResourceDef = ResourceDef {
    name: "project-categories",
    table: "project_categories",
    label: "Project category",
    id_strategy: IdStrategy::Serial,
    columns: &[req("categoryName", Text), col("description", Text)],
    parents: &[],
    cascades: &[Cascade { table: "category_milestones", condition: "\"categoryId\" = {}" }],
    default_order: "categoryName asc",
};

pub static CATEGORY_MILESTONES: ResourceDef = ResourceDef {
    name: "category-milestones",
    table: "category_milestones",
    label: "Category milestone",
    id_strategy: IdStrategy::Serial,
    columns: &[
        req("categoryId", BigInt),
        req("milestoneName", Text),
        col("description", Text),
        col("sequenceOrder", BigInt),
    ],
    parents: &[ParentLink { parent: "project-categories", column: "categoryId" }],
    cascades: &[],
    default_order: "sequenceOrder asc",
};

pub static PROJECTS: ResourceDef = ResourceDef {
    name: "projects",
    table: "projects",
    label: "Project",
    id_strategy: IdStrategy::Serial,
    columns: &[
        req("projectName", Text),
        col("projectDescription", Text),
        col("directorate", Text),
        col("startDate", Date),
        col("endDate", Date),
        col("costOfProject", Numeric),
        col("paidOut", Numeric),
        col("objective", Text),
        col("expectedOutput", Text),
        col("principalInvestigator", Text),
        col("expectedOutcome", Text),
        col("status", Text),
        col("statusReason", Text),
        col("departmentId", BigInt),
        col("sectionId", BigInt),
        col("categoryId", BigInt),
        col("subProgramId", BigInt),
    ],
    parents: &[
        ParentLink { parent: "departments", column: "departmentId" },
        ParentLink { parent: "sections", column: "sectionId" },
        ParentLink { parent: "project-categories", column: "categoryId" },
        ParentLink { parent: "subprograms", column: "subProgramId" },
    ],
    cascades: &[
        Cascade { table: "milestones", condition: "\"projectId\" = {}" },
        Cascade {
            table: "appointment_schedules",
            condition: "\"activityId\" IN (SELECT \"id\" FROM \"activities\" WHERE \"projectId\" = {})",
        },
        Cascade { table: "activities", condition: "\"projectId\" = {}" },
        Cascade { table: "project_photos", condition: "\"projectId\" = {}" },
        Cascade { table: "project_attachments", condition: "\"projectId\" = {}" },
        Cascade { table: "payment_requests", condition: "\"projectId\" = {}" },
        Cascade { table: "project_observations", condition: "\"projectId\" = {}" },
        Cascade { table: "project_maps", condition: "\"projectId\" = {}" },
    ],
    default_order: "createdAt desc",
};

pub static MILESTONES: ResourceDef = ResourceDef {
    name: "milestones",
    table: "milestones",
    label: "Milestone",
    id_strategy: IdStrategy::Serial,
    columns: &[
        req("projectId", BigInt),
        req("milestoneName", Text),
        col("description", Text),
        col("dueDate", Date),
        col("completed", Bool),
        col("completedDate", Date),
        col("sequenceOrder", BigInt),
        col("progress", Numeric),
        col("weight", Numeric),
        col("status", Text),
    ],
    parents: &[ParentLink { parent: "projects", column: "projectId" }],
    cascades: &[],
    default_order: "sequenceOrder asc",
};

pub static ACTIVITIES: ResourceDef = ResourceDef {
    name: "activities",
    table: "activities",
    label: "Activity",
    id_strategy: IdStrategy::Serial,
    columns: &[
        req("projectId", BigInt),
        req("activityName", Text),
        col("activityDescription", Text),
        col("responsibleOfficer", Text),
        col("startDate", Date),
        col("endDate", Date),
        col("budgetAllocated", Numeric),
        col("actualCost", Numeric),
        col("percentageComplete", Numeric),
        col("activityStatus", Text),
    ],
    parents: &[ParentLink { parent: "projects", column: "projectId" }],
    cascades: &[Cascade { table: "appointment_schedules", condition: "\"activityId\" = {}" }],
    default_order: "startDate asc",
};

pub static APPOINTMENT_SCHEDULES: ResourceDef = ResourceDef {
    name: "appointment-schedules",
    table: "appointment_schedules",
    label: "Appointment schedule",
    id_strategy: IdStrategy::Generated,
    columns: &[
        req("activityId", BigInt),
        req("title", Text),
        col("description", Text),
        col("startTime", Timestamp),
        col("endTime", Timestamp),
        col("location", Text),
    ],
    parents: &[ParentLink { parent: "activities", column: "activityId" }],
    cascades: &[],
    default_order: "startTime asc",
};

pub static CONTRACTORS: ResourceDef = ResourceDef {
    name: "contractors",
    table: "contractors",
    label: "Contractor",
    id_strategy: IdStrategy::Serial,
    columns: &[
        req("companyName", Text),
        col("contactPerson", Text),
        col("email", Text),
        col("phone", Text),
    ],
    parents: &[],
    cascades: &[],
    default_order: "companyName asc",
};

pub static PROJECT_PHOTOS: ResourceDef = ResourceDef {
    name: "project-photos",
    table: "project_photos",
    label: "Project photo",
    id_strategy: IdStrategy::Serial,
    columns: &[
        req("projectId", BigInt),
        req("fileName", Text),
        req("filePath", Text),
        col("mimeType", Text),
        col("fileSize", BigInt),
        col("description", Text),
        col("isDefault", Bool),
    ],
    parents: &[ParentLink { parent: "projects", column: "projectId" }],
    cascades: &[],
    default_order: "createdAt desc",
};

pub static PROJECT_ATTACHMENTS: ResourceDef = ResourceDef {
    name: "project-attachments",
    table: "project_attachments",
    label: "Project attachment",
    id_strategy: IdStrategy::Serial,
    columns: &[
        req("projectId", BigInt),
        req("fileName", Text),
        req("filePath", Text),
        col("mimeType", Text),
        col("fileSize", BigInt),
        col("description", Text),
    ],
    parents: &[ParentLink { parent: "projects", column: "projectId" }],
    cascades: &[],
    default_order: "createdAt desc",
};

pub static PAYMENT_REQUESTS: ResourceDef = ResourceDef {
    name: "payment-requests",
    table: "payment_requests",
    label: "Payment request",
    id_strategy: IdStrategy::Serial,
    columns: &[
        req("projectId", BigInt),
        col("contractorId", BigInt),
        req("amount", Numeric),
        col("description", Text),
        col("status", Text),
    ],
    parents: &[
        ParentLink { parent: "projects", column: "projectId" },
        ParentLink { parent: "contractors", column: "contractorId" },
    ],
    cascades: &[],
    default_order: "createdAt desc",
};

pub static PROJECT_OBSERVATIONS: ResourceDef = ResourceDef {
    name: "project-observations",
    table: "project_observations",
    label: "Project observation",
    id_strategy: IdStrategy::Serial,
    columns: &[
        req("projectId", BigInt),
        req("comment", Text),
        col("observationDate", Date),
    ],
    parents: &[ParentLink { parent: "projects", column: "projectId" }],
    cascades: &[],
    default_order: "createdAt desc",
};

pub static PROJECT_MAPS: ResourceDef = ResourceDef {
    name: "project-maps",
    table: "project_maps",
    label: "Project map",
    id_strategy: IdStrategy::Serial,
    columns: &[req("projectId", BigInt), req("map", Text)],
    parents: &[ParentLink { parent: "projects", column: "projectId" }],
    cascades: &[],
    default_order: "id asc",
};

pub static RESOURCES: &[&ResourceDef] = &[
    &COUNTIES,
    &SUBCOUNTIES,
    &WARDS,
    &DEPARTMENTS,
    &SECTIONS,
    &STRATEGIC_PLANS,
    &PROGRAMS,
    &SUBPROGRAMS,
    &PROJECT_CATEGORIES,
    &CATEGORY_MILESTONES,
    &PROJECTS,
    &MILESTONES,
    &ACTIVITIES,
    &APPOINTMENT_SCHEDULES,
    &CONTRACTORS,
    &PROJECT_PHOTOS,
    &PROJECT_ATTACHMENTS,
    &PAYMENT_REQUESTS,
    &PROJECT_OBSERVATIONS,
    &PROJECT_MAPS,
];

pub fn find(name: &str) -> Option<&'static ResourceDef> {
    RESOURCES.iter().copied().find(|def| def.name == name)
}
