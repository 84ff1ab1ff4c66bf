/// Prompt assets for tool-augmented generation
///
/// The system instruction and function descriptors advertised to the
/// model when a caller asks for file-action support.
use crate::completion::FunctionDef;
use serde_json::json;

/// System instruction teaching the model the file-management actions
pub fn file_assistant_instruction() -> String {
    "You are Bytrix Assistant, an AI assistant that manages files in the Bytrix system.\n\
\n\
You can call these file management actions:\n\
1. list_files - list every file the user has uploaded. Use when asked to show or enumerate files.\n\
2. get_file - fetch metadata and a signed download URL for one file. Requires file_id (UUID).\n\
3. delete_file - remove a file from storage. Requires file_id (UUID). Confirm with the user before deleting.\n\
4. file_info - detailed information about one file (size, type, upload date). Requires file_id (UUID).\n\
5. query_files - search files by filename, MIME type, size range, or upload date.\n\
\n\
Guidelines:\n\
- If a file_id is ambiguous, call list_files first and ask the user to pick.\n\
- You can only reach files owned by the current user.\n\
- When a query returns too many or too few results, help the user refine it.\n\
- If an action fails with not-found, offer to list files so the user can locate the right one.\n\
- After executing an action, confirm what was done and present the relevant details clearly."
        .to_string()
}

/// Function descriptors for the five file actions
pub fn file_action_functions() -> Vec<FunctionDef> {
    vec![
        FunctionDef {
            name: "list_files",
            description: "List all files uploaded by the current user",
            parameters: json!({
                "type": "object",
                "properties": {},
                "required": [],
            }),
        },
        FunctionDef {
            name: "get_file",
            description: "Get metadata and signed download URL for a specific file",
            parameters: json!({
                "type": "object",
                "properties": {
                    "file_id": {
                        "type": "string",
                        "description": "UUID of the file to retrieve",
                    },
                },
                "required": ["file_id"],
            }),
        },
        FunctionDef {
            name: "delete_file",
            description: "Delete a file from storage and database",
            parameters: json!({
                "type": "object",
                "properties": {
                    "file_id": {
                        "type": "string",
                        "description": "UUID of the file to delete",
                    },
                },
                "required": ["file_id"],
            }),
        },
        FunctionDef {
            name: "file_info",
            description: "Get detailed information about a specific file (size, type, date)",
            parameters: json!({
                "type": "object",
                "properties": {
                    "file_id": {
                        "type": "string",
                        "description": "UUID of the file",
                    },
                },
                "required": ["file_id"],
            }),
        },
        FunctionDef {
            name: "query_files",
            description: "Search and filter files by metadata (filename, type, size, date)",
            parameters: json!({
                "type": "object",
                "properties": {
                    "filename": {
                        "type": "string",
                        "description": "Search by filename (partial match)",
                    },
                    "mimetype": {
                        "type": "string",
                        "description": "Filter by MIME type (e.g., \"application/pdf\")",
                    },
                    "size_min": {
                        "type": "integer",
                        "description": "Minimum file size in bytes",
                    },
                    "size_max": {
                        "type": "integer",
                        "description": "Maximum file size in bytes",
                    },
                    "after_date": {
                        "type": "string",
                        "description": "Files uploaded after this date (YYYY-MM-DD)",
                    },
                },
                "required": [],
            }),
        },
    ]
}
