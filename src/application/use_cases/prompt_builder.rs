//! System prompts for the two LLM calls.
//!
//! The extraction prompt teaches the response labels the candidate parser
//! expects; the generation prompt carries the grounded schema description and
//! the Oracle formatting rules, and demands a fenced SQL block.

use std::fmt::Write;

pub struct PromptBuilder {
    schema_owner: String,
}

impl PromptBuilder {
    pub fn new(schema_owner: impl Into<String>) -> Self {
        Self {
            schema_owner: schema_owner.into(),
        }
    }

    /// System prompt for the table/column extraction call. The retrieval
    /// context block is inserted verbatim when non-empty.
    pub fn extraction_prompt(&self, retrieval_context: &str) -> String {
        let mut prompt = String::new();

        writeln!(
            prompt,
            "You are an expert in extracting table information from a user prompt. \
             Once given a prompt, respond with the table names the user is hoping to \
             query from, the columns involved, and how many of each were used."
        )
        .unwrap();
        writeln!(
            prompt,
            "Make sure you are prioritizing tables ending in \"SV\" instead of tables ending in \"MV\"."
        )
        .unwrap();
        writeln!(
            prompt,
            "If the query involves a join statement, list every table involved and how many are used.\n"
        )
        .unwrap();

        if !retrieval_context.is_empty() {
            writeln!(prompt, "Here is additional context from similar queries:").unwrap();
            writeln!(prompt, "{}", retrieval_context).unwrap();
        }

        writeln!(prompt, "For example:").unwrap();
        writeln!(
            prompt,
            "User Input:\n\"Can I get a list of Product Inquiries/MIRs where the PI CIC = \
             \"Medical - Belfast\" and the eMIR approval record Timeliness Determined Late = \
             \"Yes\"? I would like to see PI opened in the past 2 years if possible.\"\n"
        )
        .unwrap();
        writeln!(prompt, "Your Response:").unwrap();
        writeln!(prompt, "Tables: Product Inquiries, MIR").unwrap();
        writeln!(prompt, "Amount of Tables: 2").unwrap();
        writeln!(prompt, "Columns: CIC, Timeliness Determined Late, Date Opened").unwrap();
        writeln!(prompt, "Amount of Columns: 3").unwrap();

        prompt
    }

    /// System prompt for the SQL generation call, embedding the resolved
    /// schema description.
    pub fn generation_prompt(&self, schema_description: &str) -> String {
        let mut prompt = String::new();

        writeln!(
            prompt,
            "You are an expert in writing queries in Oracle SQL Syntax based on a user's request."
        )
        .unwrap();
        writeln!(
            prompt,
            "Keep in mind that the column_name inside of the double quotation marks (\") are the \
             exact names of the columns. Do not deviate from the original name.\n"
        )
        .unwrap();

        writeln!(prompt, "Schema format:").unwrap();
        writeln!(prompt, "(\"column_name1\", datatype, table_name_of_column1)").unwrap();
        writeln!(prompt, "(\"column_name2\", datatype, table_name_of_column2)\n").unwrap();

        writeln!(prompt, "Here are some guidelines:\n").unwrap();
        writeln!(
            prompt,
            "1. **Verify Tables and Columns**: Before finalizing your query, ensure that the \
             columns and tables match correctly. You must not query a column from a table without \
             first confirming that the column belongs to that specific table. You can confirm this \
             by checking if the table name is in the same parentheses as the column name."
        )
        .unwrap();
        writeln!(
            prompt,
            "2. **Verify Column Names**: Do not change the names of the columns that you are \
             given; keep them exactly how they appear, encapsulated in double quotation marks. Do \
             not add underscores as replacements for spaces. If a name is not an exact match, use \
             the closest name from the schema."
        )
        .unwrap();
        writeln!(
            prompt,
            "3. **Handle Text Fields Appropriately**: If the user gives a text-based condition, \
             adjust your query to incorporate \"LOWER\" or \"LIKE\"."
        )
        .unwrap();
        writeln!(
            prompt,
            "4. **Ensure Correct Joins**: If your query involves a join, always use \
             \"ROOT_PARENT_ID\" for joining tables. Only join tables with relevant columns."
        )
        .unwrap();
        writeln!(
            prompt,
            "5. **Select All Columns**: The select statement should include all columns with \
             \"SELECT *\"."
        )
        .unwrap();
        writeln!(
            prompt,
            "6. **Include the owner**: All table names should begin with {owner}, for example, \
             {owner}.V_ARC_PRODUCT_INQUIRY_SV",
            owner = self.schema_owner
        )
        .unwrap();
        writeln!(
            prompt,
            "7. **Use Proper Query Formatting**: Enclose your Oracle SQL query within triple \
             backticks (```). Do not enclose anything else in triple backticks except the Oracle \
             SQL query.\n"
        )
        .unwrap();

        writeln!(prompt, "Here are the Oracle SQL columns:").unwrap();
        writeln!(prompt, "{}", schema_description).unwrap();

        writeln!(prompt, "Example:").unwrap();
        writeln!(
            prompt,
            "User: I want the query that shows all the PFA Assessments where the fda reporting \
             decision is 'To be reported'."
        )
        .unwrap();
        writeln!(prompt, "Generated Query:").unwrap();
        writeln!(prompt, "```").unwrap();
        writeln!(
            prompt,
            "SELECT *\nFROM {}.V_ARC_PFA_ASSESSMENT_SV\nWHERE LOWER(\"Reporting Decision - FDA\") = ('To be reported');",
            self.schema_owner
        )
        .unwrap();
        writeln!(prompt, "```").unwrap();

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_prompt_embeds_retrieval_context_and_labels() {
        let builder = PromptBuilder::new("SYSADM");
        let context = "Here are some closely related queries to provide context:\n\
                       User Query: q\nSQL Query: SELECT 1\n";
        let prompt = builder.extraction_prompt(context);

        assert!(prompt.contains("User Query: q"));
        assert!(prompt.contains("Tables: Product Inquiries, MIR"));
        assert!(prompt.contains("Amount of Columns: 3"));
    }

    #[test]
    fn test_extraction_prompt_omits_context_section_when_empty() {
        let builder = PromptBuilder::new("SYSADM");
        let prompt = builder.extraction_prompt("");
        assert!(!prompt.contains("additional context from similar queries"));
    }

    #[test]
    fn test_generation_prompt_embeds_schema_and_owner() {
        let builder = PromptBuilder::new("SYSADM");
        let schema = "(\"Date Opened\", DATE, V_ARC_PRODUCT_INQUIRY_SV)\n";
        let prompt = builder.generation_prompt(schema);

        assert!(prompt.contains(schema));
        assert!(prompt.contains("SYSADM.V_ARC_PRODUCT_INQUIRY_SV"));
        assert!(prompt.contains("triple"));
    }
}
