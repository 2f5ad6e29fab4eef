//! Fixed content of the Titanic report: headings, prose and chart recipes.
//!
//! Recipes are written in the pipeline language understood by
//! [`crate::parser`]; the report assembler parses and binds them in order.

use crate::aggregate::AggregationSpec;

pub const PAGE_TITLE: &str = "Titanic Dataset Analysis";

/// A top-of-page chart introduced by a single H2
#[derive(Debug, Clone, Copy)]
pub struct Section {
    pub heading: &'static str,
    pub recipe: &'static str,
}

/// A hypothesis block: H2, H3, chart, explanatory paragraph
#[derive(Debug, Clone, Copy)]
pub struct Hypothesis {
    pub heading: &'static str,
    pub subheading: &'static str,
    pub recipe: &'static str,
    pub explanation: &'static str,
}

/// Grouping columns of every count table the report draws from
pub const AGGREGATIONS: [&[&str]; 6] = [
    &["Survived", "Sex"],
    &["Survived", "Pclass"],
    &["Survived", "Pclass", "Sex"],
    &["Survived", "Embarked"],
    &["Survived", "SibSp"],
    &["Survived", "Parch"],
];

pub fn aggregation_specs() -> Vec<AggregationSpec> {
    AGGREGATIONS.iter().map(|&cols| AggregationSpec::new(cols)).collect()
}

pub const BASELINE: [Section; 4] = [
    Section {
        heading: "Survival Rate based on Gender",
        recipe: r#"count(Survived, Sex)
            | bar(x: Sex, y: Count, color: Survived, position: "group")
            | labs(title: "Count of Survivors vs. Non-Survivors by Gender",
                   Sex: "Gender", Count: "Count", Survived: "Survival")"#,
    },
    Section {
        heading: "Proportion of Survivors and Non-Survivors by Passenger Class",
        recipe: r#"count(Survived, Pclass)
            | pie(names: Pclass, values: Count, color: Survived)
            | labs(title: "Proportion of Survivors and Non-Survivors by Passenger Class",
                   Count: "Count", Pclass: "Passenger Class", Survived: "Survival")"#,
    },
    Section {
        heading: "Age vs. Fare with Survival Status",
        recipe: r#"data
            | point(x: Age, y: Fare, color: Survived)
            | labs(title: "Age vs. Fare with Survival Status")"#,
    },
    Section {
        heading: "Distribution of Fares for Survivors and Non-Survivors by Passenger Class",
        recipe: r#"data
            | boxplot(x: Pclass, y: Fare, color: Survived)
            | labs(title: "Distribution of Fares for Survivors and Non-Survivors by Passenger Class",
                   Pclass: "Passenger Class", Fare: "Fare", Survived: "Survival")"#,
    },
];

pub const HYPOTHESES: [Hypothesis; 7] = [
    Hypothesis {
        heading: "Hypothesis 1: Survival Rate based on Passenger Class and Gender",
        subheading: "Bar Chart: Show the count of survivors vs. non-survivors based on passenger class and gender.",
        recipe: r#"count(Survived, Pclass, Sex)
            | bar(x: Pclass, y: Count, color: Survived, position: "group")
            | facet_grid(rows: Survived, cols: Sex)
            | labs(title: "Count of Survivors vs. Non-Survivors by Passenger Class and Gender",
                   Pclass: "Passenger Class", Count: "Count", Survived: "Survival", Sex: "Gender")"#,
        explanation: "Explanation of Hypothesis 1: This bar chart displays the count of survivors vs. non-survivors based on passenger class and gender, with separate bars for each combination of gender and survival status.",
    },
    Hypothesis {
        heading: "Hypothesis 2: Age Distribution of Survivors and Non-Survivors",
        subheading: "Box Plot: Compare the distribution of ages for survivors and non-survivors.",
        recipe: r#"data
            | boxplot(x: Survived, y: Age, color: Survived)
            | labs(title: "Distribution of Ages for Survivors and Non-Survivors",
                   Survived: "Survival", Age: "Age")"#,
        explanation: "Explanation of Hypothesis 2: This box plot compares the age distributions for survivors and non-survivors, displaying the median, quartiles, and any outliers for each group.",
    },
    Hypothesis {
        heading: "Hypothesis 3: Fare Distribution based on Passenger Class and Survival Status",
        subheading: "Violin Plot: Visualize the distribution of fares based on passenger class and survival status.",
        recipe: r#"data
            | violin(x: Pclass, y: Fare, color: Survived)
            | labs(title: "Distribution of Fares by Passenger Class and Survival",
                   Pclass: "Passenger Class", Fare: "Fare", Survived: "Survival")"#,
        explanation: "Explanation of Hypothesis 3: This violin plot shows the distribution of fares based on passenger class and survival status. It provides insights into the fare ranges and density for each combination.",
    },
    Hypothesis {
        heading: "Hypothesis 4: Survival Rate based on Port of Embarkation",
        subheading: "Bar Chart: Show the count of survivors vs. non-survivors based on port of embarkation.",
        recipe: r#"count(Survived, Embarked)
            | bar(x: Embarked, y: Count, color: Survived, position: "group")
            | labs(title: "Count of Survivors vs. Non-Survivors by Port of Embarkation",
                   Embarked: "Port of Embarkation", Count: "Count", Survived: "Survival")"#,
        explanation: "Explanation of Hypothesis 4: This bar chart displays the count of survivors vs. non-survivors based on the port of embarkation. It provides insights into whether the port of embarkation had an impact on survival rates.",
    },
    Hypothesis {
        heading: "Hypothesis 5: Survival Rate based on Number of Siblings/Spouses",
        subheading: "Bar Chart: Show the count of survivors vs. non-survivors based on the number of siblings/spouses.",
        recipe: r#"count(Survived, SibSp)
            | bar(x: SibSp, y: Count, color: Survived, position: "group")
            | labs(title: "Count of Survivors vs. Non-Survivors by Number of Siblings/Spouses",
                   SibSp: "Number of Siblings/Spouses", Count: "Count", Survived: "Survival")"#,
        explanation: "Explanation of Hypothesis 5: This bar chart displays the count of survivors vs. non-survivors based on the number of siblings/spouses onboard. It helps analyze the relationship between family size and survival rates.",
    },
    Hypothesis {
        heading: "Hypothesis 6: Survival Rate based on Fare Paid",
        subheading: "Box Plot: Compare the distribution of fares for survivors and non-survivors.",
        recipe: r#"data
            | boxplot(x: Survived, y: Fare, color: Survived)
            | labs(title: "Distribution of Fares for Survivors and Non-Survivors",
                   Survived: "Survival", Fare: "Fare")"#,
        explanation: "Explanation of Hypothesis 6: This box plot compares the fare distributions for survivors and non-survivors. It helps analyze whether the fare paid had an impact on survival rates.",
    },
    Hypothesis {
        heading: "Hypothesis 7: Survival Rate based on Number of Parents/Children",
        subheading: "Bar Chart: Show the count of survivors vs. non-survivors based on the number of parents/children.",
        recipe: r#"count(Survived, Parch)
            | bar(x: Parch, y: Count, color: Survived, position: "group")
            | labs(title: "Count of Survivors vs. Non-Survivors by Number of Parents/Children",
                   Parch: "Number of Parents/Children", Count: "Count", Survived: "Survival")"#,
        explanation: "Explanation of Hypothesis 7: This bar chart displays the count of survivors vs. non-survivors based on the number of parents/children onboard. It helps analyze the relationship between family size and survival rates.",
    },
];

pub const CONCLUSIONS_HEADING: &str = "Conclusions";
pub const CONCLUSIONS_INTRO: &str =
    "Based on the correlation heatmap, you can draw the following conclusions:";
pub const CONCLUSIONS: [&str; 4] = [
    "Fare and Pclass: There is a strong negative correlation between fare and passenger class (Pclass). This indicates that higher passenger class (lower class number) is associated with higher fares.",
    "Age and Pclass: There is a weak negative correlation between age and passenger class (Pclass). This suggests that higher passenger class tends to be associated with slightly younger passengers.",
    "Survived and Pclass: There is a moderate negative correlation between survival and passenger class (Pclass). This implies that passengers in higher classes had a higher chance of survival.",
    "Survived and Fare: There is a weak positive correlation between survival and fare. It suggests that passengers who paid higher fares had a slightly higher chance of survival.",
];

pub const CREDITS_HEADING: &str = "Credits";
pub const CREDITS_TEXT: &str = "Used Plotters to create these visualizations. \
Plotters is an open-source drawing library for Rust that renders charts to bitmap and vector backends. \
It supports a wide range of plot types, including scatter plots, bar charts, and 3D plots. \
The charts on this page are drawn server-side as SVG or PNG and embedded in a single static page.";

/// Style of the credits container, in declaration order
pub const CREDITS_STYLE: [(&str, &str); 7] = [
    ("font-size", "16px"),
    ("color", "#555555"),
    ("margin-top", "20px"),
    ("padding", "10px"),
    ("background-color", "#f7f7f7"),
    ("border", "1px solid #dddddd"),
    ("border-radius", "5px"),
];

/// Every chart recipe in page order
pub fn chart_recipes() -> impl Iterator<Item = &'static str> {
    BASELINE
        .iter()
        .map(|s| s.recipe)
        .chain(HYPOTHESES.iter().map(|h| h.recipe))
}
